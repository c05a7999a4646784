//! Default model configs loaded from environment variables.
//!
//! Three roles are provided, all against the same OpenAI-compatible endpoint:
//!
//! - **Chat**      → answer synthesis from retrieved forum context
//! - **Embedding** → post and query embeddings
//! - **Vision**    → short description of an uploaded screenshot
//!
//! # Environment variables
//!
//! - `OPENAI_API_KEY`   = API key (mandatory; startup fails without it)
//! - `OPENAI_BASE_URL`  = API base, default `https://api.openai.com`
//! - `CHAT_MODEL`       = default `gpt-3.5-turbo`
//! - `CHAT_MAX_TOKENS`  = default `300`
//! - `CHAT_TEMPERATURE` = default `0.3`
//! - `EMBEDDING_MODEL`  = default `text-embedding-3-small`
//! - `VISION_MODEL`     = default `gpt-4o-mini`
//! - `LLM_TIMEOUT_SECS` = default `60`

use crate::{
    config::llm_model_config::LlmModelConfig,
    error_handler::{
        ConfigError, Result, env_opt_f32, env_opt_u32, env_opt_u64, env_or, must_env,
        validate_http_endpoint, validate_range_f32,
    },
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o-mini";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Endpoint, key and timeout shared by every profile.
struct Connection {
    endpoint: String,
    api_key: String,
    timeout_secs: u64,
}

fn connection() -> Result<Connection> {
    let api_key = must_env("OPENAI_API_KEY")?;
    let endpoint = env_or("OPENAI_BASE_URL", DEFAULT_BASE_URL);
    validate_http_endpoint("OPENAI_BASE_URL", &endpoint)?;
    let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

    Ok(Connection {
        endpoint,
        api_key,
        timeout_secs,
    })
}

fn model_from_env(var: &'static str, default: &str) -> Result<String> {
    let model = env_or(var, default);
    if model.trim().is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }
    Ok(model)
}

/// Constructs the **chat** profile used to synthesize answers.
///
/// # Defaults
/// - `max_tokens = 300`
/// - `temperature = 0.3`
pub fn config_openai_chat() -> Result<LlmModelConfig> {
    let conn = connection()?;
    let temperature = env_opt_f32("CHAT_TEMPERATURE")?.unwrap_or(0.3);
    validate_range_f32("temperature", temperature, 0.0, 2.0)?;

    Ok(LlmModelConfig {
        model: model_from_env("CHAT_MODEL", DEFAULT_CHAT_MODEL)?,
        endpoint: conn.endpoint,
        api_key: conn.api_key,
        max_tokens: Some(env_opt_u32("CHAT_MAX_TOKENS")?.unwrap_or(300)),
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: Some(conn.timeout_secs),
    })
}

/// Constructs the **embedding** profile.
pub fn config_openai_embedding() -> Result<LlmModelConfig> {
    let conn = connection()?;

    Ok(LlmModelConfig {
        model: model_from_env("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL)?,
        endpoint: conn.endpoint,
        api_key: conn.api_key,
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(conn.timeout_secs),
    })
}

/// Constructs the **vision** profile used for screenshot descriptions.
///
/// # Defaults
/// - `max_tokens = 100`
pub fn config_openai_vision() -> Result<LlmModelConfig> {
    let conn = connection()?;

    Ok(LlmModelConfig {
        model: model_from_env("VISION_MODEL", DEFAULT_VISION_MODEL)?,
        endpoint: conn.endpoint,
        api_key: conn.api_key,
        max_tokens: Some(100),
        temperature: None,
        top_p: None,
        timeout_secs: Some(conn.timeout_secs),
    })
}
