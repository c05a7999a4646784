use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use answer_engine::QaLink;

pub const MISSING_QUESTION_ANSWER: &str = "Please provide a question to answer.";
pub const UNAVAILABLE_ANSWER: &str = "System is currently unavailable. Please try again later.";
pub const INTERNAL_ERROR_ANSWER: &str =
    "Sorry, I encountered an error while processing your question.";

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Llm(#[from] ai_llm_service::AiLlmError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("Question is required")]
    MissingQuestion,

    #[error("{0}")]
    BadRequest(String),

    /// The QA system could not be initialised; reported to clients as a
    /// normal answer so they can retry.
    #[error("QA system unavailable: {0}")]
    Unavailable(#[source] answer_engine::AnswerError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingQuestion | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unavailable(_) => StatusCode::OK,
            AppError::Llm(_) | AppError::Bind(_) | AppError::Server(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error bodies keep the `{answer, links}` shape of a normal reply.
#[derive(Serialize)]
struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    answer: &'static str,
    links: Vec<QaLink>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::MissingQuestion | AppError::BadRequest(_) => ErrorBody {
                error: Some(self.to_string()),
                answer: MISSING_QUESTION_ANSWER,
                links: vec![],
            },
            AppError::Unavailable(_) => ErrorBody {
                error: None,
                answer: UNAVAILABLE_ANSWER,
                links: vec![],
            },
            _ => ErrorBody {
                error: None,
                answer: INTERNAL_ERROR_ANSWER,
                links: vec![],
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(AppError::MissingQuestion.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_is_not_serialized() {
        let body = ErrorBody {
            error: None,
            answer: INTERNAL_ERROR_ANSWER,
            links: vec![],
        };
        let v = serde_json::to_value(&body).unwrap();
        assert!(v.get("error").is_none());
        assert_eq!(v["links"], serde_json::json!([]));
    }
}
