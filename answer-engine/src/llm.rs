//! Chat seam used by the answerer.

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::{AiLlmError, LlmServiceProfiles};

pub type ChatFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>>;

/// Sends a `(system, user)` pair and returns the assistant's text.
pub trait ChatProvider: Send + Sync {
    fn chat<'a>(&'a self, system: &'a str, user: &'a str) -> ChatFuture<'a>;
}

/// Chat profile of the shared OpenAI-compatible client.
pub struct OpenAiChat {
    profiles: Arc<LlmServiceProfiles>,
}

impl OpenAiChat {
    pub fn new(profiles: Arc<LlmServiceProfiles>) -> Self {
        Self { profiles }
    }
}

impl ChatProvider for OpenAiChat {
    fn chat<'a>(&'a self, system: &'a str, user: &'a str) -> ChatFuture<'a> {
        Box::pin(async move { self.profiles.generate(user, Some(system)).await })
    }
}
