//! Shared test doubles for chatbot tests.

use async_trait::async_trait;
use parley_core::checkpoint::CheckpointStore;
use parley_core::error::{CheckpointError, ProviderError};
use parley_core::message::{Message, Role, Thread, ThreadId};
use parley_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A provider that replays scripted outcomes and records every request.
///
/// Once the script runs out it echoes the newest user message.
pub struct RecordingProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl RecordingProvider {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn echo() -> Self {
        Self::new(vec![])
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for RecordingProvider {
    fn name(&self) -> &str {
        "recording_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let echo = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| format!("Echo: {}", m.content))
            .unwrap_or_default();
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);

        let text = self.script.lock().unwrap().pop_front().unwrap_or(Ok(echo))?;
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
        })
    }
}

/// A store whose every operation fails.
pub struct BrokenStore;

#[async_trait]
impl CheckpointStore for BrokenStore {
    fn name(&self) -> &str {
        "broken"
    }

    async fn load(&self, _id: &ThreadId) -> Result<Option<Thread>, CheckpointError> {
        Err(CheckpointError::Storage("disk on fire".into()))
    }

    async fn append(&self, _id: &ThreadId, _messages: Vec<Message>) -> Result<usize, CheckpointError> {
        Err(CheckpointError::Storage("disk on fire".into()))
    }

    async fn list(&self) -> Result<Vec<ThreadId>, CheckpointError> {
        Err(CheckpointError::Storage("disk on fire".into()))
    }

    async fn remove(&self, _id: &ThreadId) -> Result<bool, CheckpointError> {
        Err(CheckpointError::Storage("disk on fire".into()))
    }

    async fn clear(&self) -> Result<(), CheckpointError> {
        Err(CheckpointError::Storage("disk on fire".into()))
    }
}
