//! Deterministic provider that replays queued replies.
//!
//! Contains no transport logic. Every request is recorded so callers can
//! assert on exactly what would have been sent.

use super::*;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Stable provider identifier
pub const SCRIPTED_PROVIDER_ID: &str = "scripted";

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<String, ProviderError>>,
    requests: Vec<Vec<ChatMessage>>,
}

/// Replays queued replies in order; fails once the queue is empty.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<Script>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that answers with each of `replies` in turn
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
        self.lock().replies.push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: ProviderError) {
        self.lock().replies.push_back(Err(error));
    }

    /// Transcripts received so far, oldest first
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        SCRIPTED_PROVIDER_ID
    }

    fn default_model(&self) -> &str {
        SCRIPTED_PROVIDER_ID
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let mut script = self.lock();
        script.requests.push(request.messages);
        let index = script.requests.len();

        let content = script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Other("scripted provider has no replies left".into())))?;

        Ok(CompletionResponse {
            id: format!("scripted-{}", index),
            model: SCRIPTED_PROVIDER_ID.into(),
            content: Some(content),
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        })
    }
}
