use axum::{Json, response::IntoResponse};
use serde_json::json;

pub struct RootController;

impl RootController {
    pub async fn health_check() -> impl IntoResponse {
        Json(json!({
            "status": "ok",
            "service": "song-api",
            "version": env!("CARGO_PKG_VERSION"),
        }))
    }
}
