use axum::{http::StatusCode, response::Json};
use serde_json::json;

use crate::store::now_rfc3339;

pub async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "SunoLegal API",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": now_rfc3339(),
        })),
    )
}
