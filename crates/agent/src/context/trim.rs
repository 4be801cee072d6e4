//! History trimming: fit a thread's messages into a token budget.
//!
//! The default options keep the newest messages ("last" strategy), always
//! retain a leading system message, never cut a message in half, and make
//! the kept window begin on a user message. Trimming returns a new vector;
//! the input slice (the stored history) is never modified.

use crate::context::token::TokenCounter;
use parley_config::{BoundaryRole, TrimConfig, TrimStrategy};
use parley_core::message::{Message, Role};

/// Knobs for [`trim_messages`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimOptions {
    /// Total token budget, system message included.
    pub max_tokens: usize,
    pub strategy: TrimStrategy,
    /// `Last` only: keep a leading system message outside the window.
    pub include_system: bool,
    /// Allow the boundary message to be cut down to whole words that fit.
    pub allow_partial: bool,
    /// `Last` only: the kept window must begin on this role.
    pub start_on: Option<Role>,
    /// `First` only: the kept window must end on this role.
    pub end_on: Option<Role>,
}

impl Default for TrimOptions {
    fn default() -> Self {
        Self {
            max_tokens: 768,
            strategy: TrimStrategy::Last,
            include_system: true,
            allow_partial: false,
            start_on: Some(Role::User),
            end_on: None,
        }
    }
}

impl TrimOptions {
    /// Options from the validated `[trim]` config section.
    pub fn from_config(config: &TrimConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            strategy: config.strategy,
            include_system: config.include_system,
            allow_partial: config.allow_partial,
            start_on: boundary(config.start_on),
            end_on: boundary(config.end_on),
        }
    }
}

fn boundary(role: BoundaryRole) -> Option<Role> {
    match role {
        BoundaryRole::Any => None,
        BoundaryRole::User => Some(Role::User),
        BoundaryRole::Assistant => Some(Role::Assistant),
    }
}

/// Select the part of `messages` that fits `options.max_tokens`.
pub fn trim_messages(
    messages: &[Message],
    options: &TrimOptions,
    counter: &dyn TokenCounter,
) -> Vec<Message> {
    match options.strategy {
        TrimStrategy::Last => trim_last(messages, options, counter),
        TrimStrategy::First => trim_first(messages, options, counter),
    }
}

fn trim_last(messages: &[Message], options: &TrimOptions, counter: &dyn TokenCounter) -> Vec<Message> {
    let (system, rest) = match messages.split_first() {
        Some((first, rest)) if options.include_system && first.role == Role::System => {
            (Some(first), rest)
        }
        _ => (None, messages),
    };

    let mut budget = options
        .max_tokens
        .saturating_sub(system.map_or(0, |s| counter.count_message(s)));

    // Walk newest to oldest; stop at the first message that does not fit.
    let mut start = rest.len();
    for (i, message) in rest.iter().enumerate().rev() {
        let cost = counter.count_message(message);
        if cost > budget {
            break;
        }
        budget -= cost;
        start = i;
    }

    let mut window = rest[start..].to_vec();

    if options.allow_partial && start > 0 {
        if let Some(partial) = partial_message(&rest[start - 1], budget, counter, Keep::Tail) {
            window.insert(0, partial);
        }
    }

    if let Some(role) = options.start_on {
        let skip = window
            .iter()
            .position(|m| m.role == role)
            .unwrap_or(window.len());
        window.drain(..skip);
    }

    system.cloned().into_iter().chain(window).collect()
}

fn trim_first(messages: &[Message], options: &TrimOptions, counter: &dyn TokenCounter) -> Vec<Message> {
    let mut budget = options.max_tokens;
    let mut end = 0;
    for (i, message) in messages.iter().enumerate() {
        let cost = counter.count_message(message);
        if cost > budget {
            break;
        }
        budget -= cost;
        end = i + 1;
    }

    let mut window = messages[..end].to_vec();

    if options.allow_partial && end < messages.len() {
        if let Some(partial) = partial_message(&messages[end], budget, counter, Keep::Head) {
            window.push(partial);
        }
    }

    if let Some(role) = options.end_on {
        while window.last().is_some_and(|m| m.role != role) {
            window.pop();
        }
    }

    window
}

#[derive(Clone, Copy)]
enum Keep {
    Head,
    Tail,
}

/// Cut `message` down to the most whole words that fit `budget`, if any.
fn partial_message(
    message: &Message,
    budget: usize,
    counter: &dyn TokenCounter,
    keep: Keep,
) -> Option<Message> {
    let words: Vec<&str> = message.content.split_whitespace().collect();
    let slice = |n: usize| match keep {
        Keep::Head => words[..n].join(" "),
        Keep::Tail => words[words.len() - n..].join(" "),
    };

    let mut best = 0;
    for n in 1..=words.len() {
        if counter.count_message(&message.with_content(slice(n))) > budget {
            break;
        }
        best = n;
    }

    (best > 0).then(|| message.with_content(slice(best)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::token::HeuristicCounter;

    /// Each of these costs 4 overhead + 2 content = 6 tokens.
    fn msg(role: Role, text: &str) -> Message {
        Message::new(role, text)
    }

    fn contents(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.content.as_str()).collect()
    }

    fn history() -> Vec<Message> {
        vec![
            msg(Role::System, "sys1"),
            msg(Role::User, "u1-xxx"),
            msg(Role::Assistant, "a1-xxx"),
            msg(Role::User, "u2-xxx"),
            msg(Role::Assistant, "a2-xxx"),
            msg(Role::User, "u3-xxx"),
        ]
    }

    fn last(max_tokens: usize) -> TrimOptions {
        TrimOptions {
            max_tokens,
            ..TrimOptions::default()
        }
    }

    #[test]
    fn fitting_history_is_returned_whole() {
        let messages = history();
        let trimmed = trim_messages(&messages, &last(1_000), &HeuristicCounter);
        assert_eq!(trimmed, messages);
    }

    #[test]
    fn fitting_history_still_starts_on_user() {
        let messages = vec![
            msg(Role::System, "sys1"),
            msg(Role::Assistant, "a0-xxx"),
            msg(Role::User, "u1-xxx"),
        ];
        let trimmed = trim_messages(&messages, &TrimOptions::default(), &HeuristicCounter);
        assert_eq!(contents(&trimmed), vec!["sys1", "u1-xxx"]);
        assert_eq!(trimmed[1].role, Role::User);
    }

    #[test]
    fn drops_oldest_and_keeps_system() {
        // system (5) + 3 newest (18) = 23 tokens
        let trimmed = trim_messages(&history(), &last(23), &HeuristicCounter);
        assert_eq!(contents(&trimmed), vec!["sys1", "u2-xxx", "a2-xxx", "u3-xxx"]);
    }

    #[test]
    fn window_starts_on_user_message() {
        // Budget fits system + 4 newest, but the 4th-newest is an assistant turn.
        let trimmed = trim_messages(&history(), &last(29), &HeuristicCounter);
        assert_eq!(contents(&trimmed), vec!["sys1", "u2-xxx", "a2-xxx", "u3-xxx"]);
        assert_eq!(trimmed[1].role, Role::User);
    }

    #[test]
    fn start_on_can_be_disabled() {
        let options = TrimOptions {
            start_on: None,
            ..last(29)
        };
        let trimmed = trim_messages(&history(), &options, &HeuristicCounter);
        assert_eq!(
            contents(&trimmed),
            vec!["sys1", "a1-xxx", "u2-xxx", "a2-xxx", "u3-xxx"]
        );
    }

    #[test]
    fn system_survives_tiny_budget() {
        let trimmed = trim_messages(&history(), &last(3), &HeuristicCounter);
        assert_eq!(contents(&trimmed), vec!["sys1"]);
    }

    #[test]
    fn without_include_system_the_system_message_competes() {
        let options = TrimOptions {
            include_system: false,
            ..last(18)
        };
        let trimmed = trim_messages(&history(), &options, &HeuristicCounter);
        assert_eq!(contents(&trimmed), vec!["u2-xxx", "a2-xxx", "u3-xxx"]);
    }

    #[test]
    fn never_returns_partial_message_by_default() {
        let mut messages = history();
        messages.push(msg(Role::Assistant, &"word ".repeat(40)));
        messages.push(msg(Role::User, "u4-xxx"));
        let trimmed = trim_messages(&messages, &last(20), &HeuristicCounter);
        assert_eq!(contents(&trimmed), vec!["sys1", "u4-xxx"]);
        for kept in &trimmed {
            assert!(messages.iter().any(|m| m == kept));
        }
    }

    #[test]
    fn allow_partial_keeps_trailing_words() {
        let messages = vec![
            msg(Role::System, "sys1"),
            msg(Role::User, "one two three four five six seven eight"),
            msg(Role::Assistant, "a1-xxx"),
        ];
        let options = TrimOptions {
            allow_partial: true,
            start_on: None,
            ..last(5 + 6 + 9)
        };
        let trimmed = trim_messages(&messages, &options, &HeuristicCounter);
        // 9 tokens left: 4 overhead + 5 content tokens = up to 20 chars
        assert_eq!(trimmed.len(), 3);
        assert_eq!(trimmed[1].content, "five six seven eight");
        assert_eq!(trimmed[1].id, messages[1].id);
        assert_eq!(trimmed[2].content, "a1-xxx");
    }

    #[test]
    fn input_is_not_modified() {
        let messages = history();
        let before = messages.clone();
        let _ = trim_messages(&messages, &last(10), &HeuristicCounter);
        assert_eq!(messages, before);
    }

    #[test]
    fn first_strategy_keeps_oldest() {
        let options = TrimOptions {
            strategy: TrimStrategy::First,
            ..last(17)
        };
        let trimmed = trim_messages(&history(), &options, &HeuristicCounter);
        assert_eq!(contents(&trimmed), vec!["sys1", "u1-xxx", "a1-xxx"]);
    }

    #[test]
    fn first_strategy_honours_end_on() {
        let options = TrimOptions {
            strategy: TrimStrategy::First,
            end_on: Some(Role::User),
            ..last(17)
        };
        let trimmed = trim_messages(&history(), &options, &HeuristicCounter);
        assert_eq!(contents(&trimmed), vec!["sys1", "u1-xxx"]);
    }

    #[test]
    fn empty_history_is_empty() {
        assert!(trim_messages(&[], &TrimOptions::default(), &HeuristicCounter).is_empty());
    }

    #[test]
    fn options_from_config() {
        let config = TrimConfig {
            max_tokens: 512,
            strategy: TrimStrategy::First,
            include_system: false,
            allow_partial: true,
            start_on: BoundaryRole::Any,
            end_on: BoundaryRole::User,
        };
        let options = TrimOptions::from_config(&config);
        assert_eq!(options.max_tokens, 512);
        assert_eq!(options.strategy, TrimStrategy::First);
        assert!(!options.include_system);
        assert!(options.allow_partial);
        assert_eq!(options.start_on, None);
        assert_eq!(options.end_on, Some(Role::User));

        let defaults = TrimOptions::from_config(&TrimConfig::default());
        assert_eq!(defaults, TrimOptions::default());
    }
}
