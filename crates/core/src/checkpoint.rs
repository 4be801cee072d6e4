//! Checkpoint trait — per-thread conversation state.
//!
//! A checkpoint store keeps the full message list of every thread between
//! calls. Stores are append-only from the chatbot's point of view: messages
//! are never reordered or rewritten, only added at the end.

use crate::error::CheckpointError;
use crate::message::{Message, Thread, ThreadId};
use async_trait::async_trait;

/// The core CheckpointStore trait.
///
/// Implementation: in-memory (process lifetime only).
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Load the thread's transcript. Unknown ids yield `None`.
    async fn load(&self, id: &ThreadId) -> std::result::Result<Option<Thread>, CheckpointError>;

    /// Append messages to the thread, creating it on first use.
    /// Returns the thread length after the append.
    async fn append(
        &self,
        id: &ThreadId,
        messages: Vec<Message>,
    ) -> std::result::Result<usize, CheckpointError>;

    /// All known thread ids.
    async fn list(&self) -> std::result::Result<Vec<ThreadId>, CheckpointError>;

    /// Drop one thread. Returns whether it existed.
    async fn remove(&self, id: &ThreadId) -> std::result::Result<bool, CheckpointError>;

    /// Drop every thread.
    async fn clear(&self) -> std::result::Result<(), CheckpointError>;
}
