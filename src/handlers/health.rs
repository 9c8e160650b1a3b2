use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "places": state.resolver.places().state(),
        "admin_locations": state.resolver.admin_index().len(),
        "open_fields": state.sessions.len(),
    }))
}
