//! Liveness probe.

// crates.io
use axum::Json;
use serde_json::{Value, json};

/// `GET /`: always answers `{"ok":true}`.
pub async fn health() -> Json<Value> {
	Json(json!({ "ok": true }))
}
