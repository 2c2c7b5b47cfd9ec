//! # GET /health

use axum::Json;

/// GET /health — 死活確認（認証不要）。
pub async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
