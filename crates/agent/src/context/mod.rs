//! Context preparation for a model call.
//!
//! `token` estimates sizes, `trim` selects the slice of history that fits
//! the configured budget.

pub mod token;
pub mod trim;

pub use token::{HeuristicCounter, TokenCounter};
pub use trim::{TrimOptions, trim_messages};
