use crate::api::AppState;
use crate::domain::schedule::ScheduledPushStatus;
use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use uuid::Uuid;

/// Point lookup. Unknown or unparseable ids answer an empty object rather
/// than an error.
pub async fn status(State(state): State<AppState>, Path(id): Path<String>) -> Json<Value> {
    let Ok(id) = Uuid::parse_str(&id) else {
        return Json(json!({}));
    };

    match state.scheduler.status(id).await {
        Some(status) => Json(serde_json::to_value(status).unwrap_or_else(|_| json!({}))),
        None => Json(json!({})),
    }
}

/// Batch lookup. Each id resolves independently; unparseable and unknown ids
/// are omitted from the result map.
pub async fn status_batch(
    State(state): State<AppState>,
    Json(ids): Json<Vec<String>>,
) -> Json<HashMap<Uuid, ScheduledPushStatus>> {
    let ids: Vec<Uuid> = ids.iter().filter_map(|id| Uuid::parse_str(id).ok()).collect();
    Json(state.scheduler.statuses(&ids).await)
}
