use std::error::Error;

use ai_llm_service::telemetry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file if present.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    // `LOG_LEVEL` raises the workspace crates without touching dependencies.
    tracing_subscriber::registry()
        .with(telemetry::env_filter(
            "info",
            telemetry::workspace_level_from_env("LOG_LEVEL"),
        ))
        .with(telemetry::layer())
        .try_init()?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting forum QA backend");

    api::start().await?;

    Ok(())
}
