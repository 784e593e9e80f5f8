use crate::api::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

/// Best-effort cancellation: always succeeds, whether or not the id was
/// known. A delivery already handed to the gateway is not aborted.
pub async fn cancel(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    if let Ok(id) = Uuid::parse_str(&id) {
        state.scheduler.cancel(id).await;
    }
    StatusCode::OK
}
