//! Liveness and discovery endpoints.

use axum::Json;
use serde_json::{Value, json};

/// Handler: GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Handler: GET /
pub async fn banner() -> Json<Value> {
    Json(json!({
        "message": "Forum QA API",
        "endpoints": {
            "POST /api/": "Answer questions",
            "GET /health": "Health check"
        }
    }))
}
