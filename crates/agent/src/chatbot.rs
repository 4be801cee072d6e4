//! The chatbot: one entry point that always answers with text.

use std::sync::Arc;

use parley_config::{AppConfig, ConfigError};
use parley_core::checkpoint::CheckpointStore;
use parley_core::error::{CheckpointError, ProviderError};
use parley_core::message::{Message, Role, Thread, ThreadId};
use parley_core::provider::{Provider, ProviderRequest, Usage};
use parley_memory::InMemoryCheckpointer;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::context::{HeuristicCounter, TokenCounter, TrimOptions, trim_messages};
use crate::prompt::PromptTemplate;

/// Longest accepted thread id.
pub const MAX_THREAD_ID_LEN: usize = 128;

/// Longest accepted language name.
pub const MAX_LANGUAGE_LEN: usize = 64;

/// Why a turn could not produce a model answer.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("{0}")]
    InvalidInput(String),

    #[error("model call failed: {0}")]
    Model(#[from] ProviderError),

    #[error("checkpoint store failed: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// The fixed text a user sees in place of a failed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    EmptyQuery,
    InvalidInput(String),
    ModelError,
    Unexpected,
}

impl Fallback {
    pub const EMPTY_QUERY: &'static str =
        "I cannot process an empty query. Please provide some input.";
    pub const MODEL_ERROR: &'static str =
        "I apologize, but I encountered an error. Please try again.";
    pub const UNEXPECTED: &'static str = "I apologize, but I encountered an unexpected error. \
Please try again or contact support if the issue persists.";

    pub fn for_error(err: &ChatError) -> Self {
        match err {
            ChatError::EmptyQuery => Self::EmptyQuery,
            ChatError::InvalidInput(reason) => Self::InvalidInput(reason.clone()),
            ChatError::Model(_) => Self::ModelError,
            ChatError::Checkpoint(_) => Self::Unexpected,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::EmptyQuery => Self::EMPTY_QUERY.into(),
            Self::InvalidInput(reason) => format!("I couldn't process your request: {reason}"),
            Self::ModelError => Self::MODEL_ERROR.into(),
            Self::Unexpected => Self::UNEXPECTED.into(),
        }
    }
}

impl std::fmt::Display for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// One answered turn.
#[derive(Debug, Clone)]
pub struct Reply {
    pub thread_id: ThreadId,
    pub content: String,
    pub usage: Option<Usage>,
}

/// Composes the system prompt, trims history, calls the model, and records
/// both sides of every exchange in the checkpoint store.
///
/// Built once at startup and shared behind an `Arc`.
pub struct ChatBot {
    provider: Arc<dyn Provider>,
    store: Arc<dyn CheckpointStore>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    prompt: PromptTemplate,
    default_language: String,
    trim: TrimOptions,
    counter: Arc<dyn TokenCounter>,
}

impl ChatBot {
    pub fn new(provider: Arc<dyn Provider>, store: Arc<dyn CheckpointStore>) -> Self {
        Self {
            provider,
            store,
            model: "llama3-8b-8192".into(),
            temperature: 0.7,
            max_tokens: Some(2048),
            prompt: PromptTemplate::default(),
            default_language: "English".into(),
            trim: TrimOptions::default(),
            counter: Arc::new(HeuristicCounter),
        }
    }

    /// Wire the configured provider to a fresh in-memory store.
    ///
    /// Fails when no API key is configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let provider = parley_providers::build_from_config(config)?;
        let store = InMemoryCheckpointer::new().with_max_threads(config.checkpoint.max_threads);

        Ok(Self::new(provider, Arc::new(store))
            .with_model(config.provider.model.clone())
            .with_temperature(config.provider.temperature)
            .with_max_tokens(config.provider.max_tokens)
            .with_prompt(PromptTemplate::new(config.prompt.system_template.clone()))
            .with_default_language(config.prompt.default_language.clone())
            .with_trim(TrimOptions::from_config(&config.trim)))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    pub fn with_trim(mut self, options: TrimOptions) -> Self {
        self.trim = options;
        self
    }

    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Answer `query` in `thread_id`, or explain why not.
    ///
    /// A failed model call still records the model-error fallback as the
    /// assistant turn before returning [`ChatError::Model`].
    pub async fn respond(
        &self,
        query: &str,
        language: Option<&str>,
        thread_id: Option<&str>,
    ) -> Result<Reply, ChatError> {
        let thread_id = resolve_thread_id(thread_id);
        self.respond_in(&thread_id, query, language).await
    }

    /// Like [`respond`](Self::respond) but never fails: errors become their
    /// fallback text. The thread id is echoed back either way.
    pub async fn reply(
        &self,
        query: &str,
        language: Option<&str>,
        thread_id: Option<&str>,
    ) -> Reply {
        let thread_id = resolve_thread_id(thread_id);
        match self.respond_in(&thread_id, query, language).await {
            Ok(reply) => reply,
            Err(e) => {
                match &e {
                    ChatError::EmptyQuery => debug!(thread_id = %thread_id, "Empty query rejected"),
                    ChatError::InvalidInput(reason) => {
                        warn!(thread_id = %thread_id, reason = %reason, "Invalid chat input")
                    }
                    // Already logged where the call failed.
                    ChatError::Model(_) => {}
                    ChatError::Checkpoint(err) => {
                        error!(thread_id = %thread_id, error = %err, "Unexpected error while generating response")
                    }
                }
                Reply {
                    thread_id,
                    content: Fallback::for_error(&e).message(),
                    usage: None,
                }
            }
        }
    }

    /// Answer `query`, always with non-empty text.
    pub async fn generate_response(
        &self,
        query: &str,
        language: Option<&str>,
        thread_id: Option<&str>,
    ) -> String {
        self.reply(query, language, thread_id).await.content
    }

    /// The stored transcript of a thread.
    pub async fn history(&self, thread_id: &str) -> Result<Option<Thread>, ChatError> {
        Ok(self.store.load(&ThreadId::from(thread_id)).await?)
    }

    /// Forget one thread. Returns whether it existed.
    pub async fn clear_thread(&self, thread_id: &str) -> Result<bool, ChatError> {
        Ok(self.store.remove(&ThreadId::from(thread_id)).await?)
    }

    async fn respond_in(
        &self,
        thread_id: &ThreadId,
        query: &str,
        language: Option<&str>,
    ) -> Result<Reply, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::EmptyQuery);
        }
        validate_thread_id(thread_id)?;
        let language = self.resolve_language(language)?;

        info!(thread_id = %thread_id, language = %language, "Generating response");

        self.store
            .append(thread_id, vec![Message::user(query)])
            .await?;

        // The store lock is released here; the model call runs without it.
        let thread = self.store.load(thread_id).await?.ok_or_else(|| {
            CheckpointError::Storage(format!("thread {thread_id} missing after append"))
        })?;

        let mut messages = Vec::with_capacity(thread.len() + 1);
        messages.push(self.prompt.system_message(language));
        messages.extend(thread.messages);
        let window = trim_messages(&messages, &self.trim, self.counter.as_ref());

        debug!(
            thread_id = %thread_id,
            history = messages.len(),
            kept = window.len(),
            tokens = self.counter.count_messages(&window),
            "Trimmed history"
        );
        if !window.iter().any(|m| m.role == Role::User) {
            warn!(
                thread_id = %thread_id,
                budget = self.trim.max_tokens,
                "Newest message exceeds the history budget; sending system prompt only"
            );
        }

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: window,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let outcome = match self.provider.complete(request).await {
            Ok(response) if response.message.content.trim().is_empty() => {
                Err(ProviderError::EmptyResponse)
            }
            other => other,
        };

        match outcome {
            Ok(response) => {
                let answer = Message::assistant(response.message.content);
                let content = answer.content.clone();
                self.store.append(thread_id, vec![answer]).await?;

                info!(
                    thread_id = %thread_id,
                    model = %response.model,
                    chars = content.len(),
                    "Response generated"
                );

                Ok(Reply {
                    thread_id: thread_id.clone(),
                    content,
                    usage: response.usage,
                })
            }
            Err(e) => {
                error!(thread_id = %thread_id, model = %self.model, error = %e, "Model call failed");
                self.store
                    .append(thread_id, vec![Message::assistant(Fallback::MODEL_ERROR)])
                    .await?;
                Err(ChatError::Model(e))
            }
        }
    }

    fn resolve_language<'a>(&'a self, language: Option<&'a str>) -> Result<&'a str, ChatError> {
        match language.map(str::trim).filter(|l| !l.is_empty()) {
            None => Ok(&self.default_language),
            Some(l) if l.chars().count() > MAX_LANGUAGE_LEN => Err(ChatError::InvalidInput(
                format!("language must be at most {MAX_LANGUAGE_LEN} characters"),
            )),
            Some(l) if l.chars().any(char::is_control) => Err(ChatError::InvalidInput(
                "language contains control characters".into(),
            )),
            Some(l) => Ok(l),
        }
    }
}

/// Use the caller's thread id, or start a new thread when none is given.
fn resolve_thread_id(thread_id: Option<&str>) -> ThreadId {
    thread_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ThreadId::from)
        .unwrap_or_else(ThreadId::new)
}

fn validate_thread_id(id: &ThreadId) -> Result<(), ChatError> {
    if id.as_str().len() > MAX_THREAD_ID_LEN {
        return Err(ChatError::InvalidInput(format!(
            "thread id must be at most {MAX_THREAD_ID_LEN} bytes"
        )));
    }
    if id.as_str().chars().any(char::is_control) {
        return Err(ChatError::InvalidInput(
            "thread id contains control characters".into(),
        ));
    }
    Ok(())
}
