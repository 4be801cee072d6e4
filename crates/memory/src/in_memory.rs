//! In-memory checkpoint store: one transcript per thread id.

use async_trait::async_trait;
use parley_core::checkpoint::CheckpointStore;
use parley_core::error::CheckpointError;
use parley_core::message::{Message, Thread, ThreadId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Stores threads in a `HashMap` behind an async `RwLock`.
///
/// With a thread limit set, creating a new thread beyond the limit evicts
/// the thread that was updated least recently.
pub struct InMemoryCheckpointer {
    threads: Arc<RwLock<HashMap<ThreadId, Thread>>>,
    max_threads: Option<usize>,
}

impl InMemoryCheckpointer {
    pub fn new() -> Self {
        Self {
            threads: Arc::new(RwLock::new(HashMap::new())),
            max_threads: None,
        }
    }

    /// Bound the number of threads kept. `0` means unbounded.
    pub fn with_max_threads(mut self, max: usize) -> Self {
        self.max_threads = (max > 0).then_some(max);
        self
    }

    /// Number of stored threads.
    pub async fn len(&self) -> usize {
        self.threads.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.threads.read().await.is_empty()
    }
}

impl Default for InMemoryCheckpointer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointer {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self, id: &ThreadId) -> Result<Option<Thread>, CheckpointError> {
        Ok(self.threads.read().await.get(id).cloned())
    }

    async fn append(&self, id: &ThreadId, messages: Vec<Message>) -> Result<usize, CheckpointError> {
        let mut threads = self.threads.write().await;

        if let Some(max) = self.max_threads {
            if threads.len() >= max && !threads.contains_key(id) {
                if let Some(oldest) = threads
                    .values()
                    .min_by_key(|t| t.updated_at)
                    .map(|t| t.id.clone())
                {
                    debug!(thread_id = %oldest, "Evicting least recently active thread");
                    threads.remove(&oldest);
                }
            }
        }

        let thread = threads
            .entry(id.clone())
            .or_insert_with(|| Thread::new(id.clone()));
        for message in messages {
            thread.push(message);
        }
        Ok(thread.len())
    }

    async fn list(&self) -> Result<Vec<ThreadId>, CheckpointError> {
        Ok(self.threads.read().await.keys().cloned().collect())
    }

    async fn remove(&self, id: &ThreadId) -> Result<bool, CheckpointError> {
        Ok(self.threads.write().await.remove(id).is_some())
    }

    async fn clear(&self) -> Result<(), CheckpointError> {
        self.threads.write().await.clear();
        Ok(())
    }
}
