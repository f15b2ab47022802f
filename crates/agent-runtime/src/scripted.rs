//! Scripted Provider
//!
//! For tests and offline demos. Replies with queued canned completions in
//! order and records every request it receives.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use agent_core::{
    error::{AgentError, Result},
    message::Message,
    provider::{
        Completion, CompletionStream, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo,
        StreamChunk,
    },
};
use async_trait::async_trait;

/// A request seen by the scripted provider
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub options: GenerationOptions,
}

impl RecordedRequest {
    /// Content of the last user message, if any
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == agent_core::Role::User)
            .map(|m| m.content.as_str())
    }

    /// Content of the system prompt, if any
    pub fn system_text(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == agent_core::Role::System)
            .map(|m| m.content.as_str())
    }
}

#[derive(Clone, Debug)]
enum Reply {
    Text(String),
    Failure(String),
}

/// Provider that replays canned replies
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with replies returned in the given order
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        for reply in replies {
            provider.push_reply(reply);
        }
        provider
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock_replies().push_back(Reply::Text(reply.into()));
    }

    /// Queue a provider failure
    pub fn push_failure(&self, message: impl Into<String>) {
        self.lock_replies().push_back(Reply::Failure(message.into()));
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.lock_replies().len()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Reply>> {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_reply(&self, messages: &[Message], options: &GenerationOptions) -> Result<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                messages: messages.to_vec(),
                options: options.clone(),
            });

        match self.lock_replies().pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Failure(message)) => Err(AgentError::Provider(message)),
            None => Err(AgentError::ProviderUnavailable("no scripted replies left".into())),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        Ok(ProviderInfo {
            name: "Scripted".into(),
            version: None,
            models: self.list_models().await?,
            supports_streaming: true,
            supports_structured_output: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let text = self.next_reply(messages, options)?;
        Ok(Completion::text(text, &options.model))
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<CompletionStream> {
        let text = self.next_reply(messages, options)?;

        let words: Vec<String> = text.split_inclusive(' ').map(str::to_string).collect();
        let count = words.len();
        let chunks = words.into_iter().enumerate().map(move |(i, delta)| {
            Ok(StreamChunk {
                delta,
                done: i + 1 == count,
                usage: None,
            })
        });

        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo {
            id: "scripted".into(),
            name: "Scripted replies".into(),
            context_length: None,
        }])
    }
}
