//! Shared LLM service with three active profiles: `chat`, `embedding`, and `vision`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (endpoint+model+key+timeout).
//! - If `vision` profile is not provided, it falls back to `chat`.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::LlmServiceProfiles;
//! use ai_llm_service::config::default_config::{config_openai_chat, config_openai_embedding};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let svc = Arc::new(LlmServiceProfiles::new(
//!         config_openai_chat()?,
//!         config_openai_embedding()?,
//!         None,
//!     ));
//!
//!     let txt = svc.generate("Hello world", None).await?;
//!     println!("CHAT: {}", txt);
//!
//!     let emb = svc.embed("Ferris").await?;
//!     println!("Embedding dim = {}", emb.len());
//!
//!     Ok(())
//! }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    config::{
        default_config::{config_openai_chat, config_openai_embedding, config_openai_vision},
        llm_model_config::LlmModelConfig,
    },
    error_handler::AiLlmError,
    services::open_ai_service::OpenAiService,
};

/// Shared service that manages the **chat**, **embedding** and **vision** profiles.
///
/// Internally, it caches OpenAI clients keyed by their configuration to
/// avoid recreating HTTP clients on each call.
pub struct LlmServiceProfiles {
    chat: LlmModelConfig,
    embedding: LlmModelConfig,
    vision: LlmModelConfig,

    clients: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,
}

impl LlmServiceProfiles {
    /// Creates a new service.
    ///
    /// - `chat`: profile for answer generation.
    /// - `embedding`: profile for embeddings.
    /// - `vision_opt`: optional vision profile. If `None`, falls back to `chat`.
    pub fn new(
        chat: LlmModelConfig,
        embedding: LlmModelConfig,
        vision_opt: Option<LlmModelConfig>,
    ) -> Self {
        let vision = vision_opt.unwrap_or_else(|| chat.clone());

        Self {
            chat,
            embedding,
            vision,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Builds all three profiles from environment variables.
    ///
    /// # Errors
    /// Returns [`AiLlmError::Config`] when `OPENAI_API_KEY` is missing or a
    /// numeric variable fails to parse.
    pub fn from_env() -> Result<Self, AiLlmError> {
        Ok(Self::new(
            config_openai_chat()?,
            config_openai_embedding()?,
            Some(config_openai_vision()?),
        ))
    }

    /// Generates text using the **chat** profile.
    ///
    /// # Arguments
    /// - `prompt`: user message.
    /// - `system`: optional system instruction.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if generation fails.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let cli = self.client_for(&self.chat).await?;
        cli.generate(prompt, system).await
    }

    /// Computes one embedding using the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if embedding fails.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let cli = self.client_for(&self.embedding).await?;
        cli.embeddings(input).await
    }

    /// Computes embeddings for a batch of inputs in one request.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the request fails or the vector count differs.
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        let cli = self.client_for(&self.embedding).await?;
        cli.embeddings_batch(inputs).await
    }

    /// Describes an image with the **vision** profile.
    ///
    /// `image_url` may be a `data:image/...;base64,` URL.
    pub async fn describe_image(&self, prompt: &str, image_url: &str) -> Result<String, AiLlmError> {
        let cli = self.client_for(&self.vision).await?;
        cli.describe_image(prompt, image_url).await
    }

    /// Returns references to the current profiles `(chat, embedding, vision)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig, &LlmModelConfig) {
        (&self.chat, &self.embedding, &self.vision)
    }

    /* --------------------- Internals --------------------- */

    async fn client_for(&self, cfg: &LlmModelConfig) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.clients.read().await.get(&key).cloned() {
            return Ok(cli);
        }

        let mut w = self.clients.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(model: &str) -> LlmModelConfig {
        LlmModelConfig {
            model: model.into(),
            endpoint: "http://127.0.0.1:9".into(),
            api_key: "sk-test".into(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(1),
        }
    }

    #[test]
    fn vision_falls_back_to_chat() {
        let svc = LlmServiceProfiles::new(cfg("chat"), cfg("embed"), None);
        let (chat, embedding, vision) = svc.profiles();
        assert_eq!(chat, vision);
        assert_eq!(embedding.model, "embed");
    }

    #[tokio::test]
    async fn clients_are_cached_per_config() {
        let svc = LlmServiceProfiles::new(cfg("chat"), cfg("embed"), None);

        let a = svc.client_for(&svc.chat).await.unwrap();
        let b = svc.client_for(&svc.vision).await.unwrap();
        let c = svc.client_for(&svc.embedding).await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(svc.clients.read().await.len(), 2);
    }
}
