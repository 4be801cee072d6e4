//! Checkpoint store implementations for Parley.
//!
//! Conversation state lives in process memory only; restarting the process
//! starts every thread from scratch.

pub mod in_memory;

pub use in_memory::InMemoryCheckpointer;
