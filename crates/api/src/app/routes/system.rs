use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app::errors;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

pub async fn not_found() -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "route not found")
}
