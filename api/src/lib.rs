use std::{any::Any, env, sync::Arc};

pub mod core;
pub mod error_handler;
pub mod image_context;
mod routes;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use ai_llm_service::LlmServiceProfiles;

use crate::{
    core::app_state::AppState,
    error_handler::AppError,
    routes::{
        ask::ask_question_route::ask_question,
        system_route::{banner, health},
    },
};

/// Largest accepted request body (screenshots arrive inline as base64).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_PORT: &str = "5005";

/// Starts the HTTP server and blocks until Ctrl+C.
///
/// Fails only when the LLM credentials are missing or the listener cannot be
/// bound. A QA system that cannot be initialised at startup is retried on the
/// first request.
pub async fn start() -> Result<(), AppError> {
    let host_url = listen_address();
    let force_rebuild = env_flag("REBUILD_INDEX");

    let profiles = Arc::new(LlmServiceProfiles::from_env()?);
    let state = Arc::new(AppState::from_profiles(profiles, force_rebuild));

    info!(force_rebuild, "Initializing QA system...");
    if state.qa().await.is_err() {
        error!("QA system not ready; will retry on the next request");
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %host_url, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("Server stopped");
    Ok(())
}

/// Router with every route and the shared middleware stack.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/api", post(ask_question))
        .route("/api/", post(ask_question))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(state)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    error!(panic = %detail, "Request handler panicked");
    AppError::Internal(detail).into_response()
}

/// `API_ADDRESS`, else `0.0.0.0:$PORT` (port 5005 by default).
fn listen_address() -> String {
    env::var("API_ADDRESS")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| {
            let port = env::var("PORT").unwrap_or_else(|_| DEFAULT_PORT.into());
            format!("0.0.0.0:{port}")
        })
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
