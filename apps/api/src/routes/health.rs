use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Reports `degraded` when the template file cannot be found, since every
/// render would then fail with `TEMPLATE_MISSING`.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let template_ready = tokio::fs::try_exists(&state.config.template_path)
        .await
        .unwrap_or(false);

    Json(json!({
        "status": if template_ready { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME"),
        "template": {
            "path": state.config.template_path.display().to_string(),
            "ready": template_ready,
        },
        "logo_mode": state.config.logo_mode.to_string(),
    }))
}
