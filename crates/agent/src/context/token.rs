//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token.
//! This approximation stays within ~10% of BPE tokenizers (Llama 3,
//! GPT-4) on English text, which is enough to keep the history under the
//! model's context window.

use parley_core::message::Message;

/// Counts tokens for budget enforcement.
pub trait TokenCounter: Send + Sync {
    /// Tokens for a message including its framing overhead.
    fn count_message(&self, message: &Message) -> usize;

    /// Tokens for a slice of messages.
    fn count_messages(&self, messages: &[Message]) -> usize {
        messages.iter().map(|m| self.count_message(m)).sum()
    }
}

/// The default ~4 chars/token counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicCounter;

impl TokenCounter for HeuristicCounter {
    fn count_message(&self, message: &Message) -> usize {
        estimate_message_tokens(message)
    }
}

/// Per-message cost of role name, delimiters, and formatting markers.
pub const MESSAGE_OVERHEAD: usize = 4;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Estimate tokens for a single message including per-message overhead.
pub fn estimate_message_tokens(message: &Message) -> usize {
    MESSAGE_OVERHEAD + estimate_tokens(&message.content)
}
