//! POST /api/ — answers a student question, optionally with a screenshot.

use std::{sync::Arc, time::Instant};

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::info;

use answer_engine::QaResponse;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    image_context,
    routes::ask::ask_request::AskRequest,
};

/// Handler: POST /api/
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:5005/api/ \
///   -H 'content-type: application/json' \
///   -d '{"question":"Should I use Docker or Podman?"}'
/// ```
pub async fn ask_question(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> AppResult<Json<QaResponse>> {
    let Json(body) = payload?;
    let question = body.question().ok_or(AppError::MissingQuestion)?;

    let question = match body.image() {
        Some(image) => {
            let image_ctx = image_context::describe_image(state.vision(), image).await;
            info!(image_context = %image_ctx, "Image attached to question");
            image_context::rewrite_question(question)
        }
        None => question.to_string(),
    };

    let qa = state.qa().await.map_err(AppError::Unavailable)?;

    let t0 = Instant::now();
    let res = qa.answer_question(&question).await;
    info!(
        links = res.links.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Question answered"
    );

    Ok(Json(res))
}
