//! Shared client for OpenAI-compatible hosted models.
//!
//! The crate exposes three logical profiles through
//! [`service_profiles::LlmServiceProfiles`]:
//! - **chat**: answer synthesis (`/v1/chat/completions`)
//! - **embedding**: single and batched embeddings (`/v1/embeddings`)
//! - **vision**: short descriptions of uploaded screenshots
//!
//! Construct the profiles once at startup, wrap them in `Arc` and hand clones
//! to the components that need them.

pub mod config;
pub mod error_handler;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use error_handler::{AiLlmError, Result};
pub use service_profiles::LlmServiceProfiles;
