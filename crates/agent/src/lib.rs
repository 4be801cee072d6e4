//! Chat orchestration for Parley.
//!
//! A turn runs as:
//!
//! 1. **Validate** the query (blank queries never reach the model)
//! 2. **Record** the user message in the thread's checkpoint
//! 3. **Build context**: system prompt for the requested language, then the
//!    thread history trimmed to the token budget
//! 4. **Call the model** via the configured provider
//! 5. **Record** the answer (or the fallback text when the call failed)
//!
//! [`ChatBot::generate_response`] always returns non-empty text.

pub mod chatbot;
pub mod context;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use chatbot::{ChatBot, ChatError, Fallback, Reply};
pub use context::{HeuristicCounter, TokenCounter, TrimOptions, trim_messages};
pub use parley_config::{BoundaryRole, TrimStrategy};
pub use prompt::PromptTemplate;
