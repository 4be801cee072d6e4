//! # Parley Core
//!
//! Domain types, traits, and error definitions for the Parley chatbot.
//! This crate has **no framework dependencies**: it defines the domain model
//! that the provider, memory, agent and gateway crates implement against.
//!
//! ## Layout
//!
//! - [`message`]: messages, roles, and per-thread transcripts
//! - [`provider`]: the [`Provider`] trait over hosted model APIs
//! - [`checkpoint`]: the [`CheckpointStore`] trait keyed by thread id
//! - [`error`]: `thiserror` error enums for each bounded context

pub mod checkpoint;
pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use checkpoint::CheckpointStore;
pub use error::{CheckpointError, ProviderError};
pub use message::{Message, Role, Thread, ThreadId};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
