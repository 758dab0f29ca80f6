use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::llm_client::MODEL;
use crate::state::AppState;

/// GET /health
/// Returns service status and whether refinement can run.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let configuration_error = state.pipeline().err().map(|e| e.to_string());

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "letter-refiner",
        "model": MODEL,
        "llm_configured": configuration_error.is_none(),
        "configuration_error": configuration_error
    }))
}
