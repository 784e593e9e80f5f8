use crate::api::AppState;
use crate::api::schemas::BatchScheduleResponse;
use crate::domain::push::PushRequest;
use crate::error::{AppError, Result};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Schedules a single push delivery.
///
/// # Errors
/// Returns `AppError::Forbidden` if the topic is outside the configured
/// prefix, or `AppError::BadRequest` if the schedule fails validation.
pub async fn schedule(
    State(state): State<AppState>,
    Json(request): Json<PushRequest>,
) -> Result<impl IntoResponse> {
    if !state.config.apns.topic_policy().allows(&request.topic) {
        return Err(AppError::Forbidden(format!("topic {} is not allowed", request.topic)));
    }

    state.scheduler.schedule(&request).await?;
    Ok(StatusCode::OK)
}

/// Schedules a batch of push deliveries. Entries are decoded and processed
/// independently; a rejected or malformed entry never aborts the rest.
pub async fn schedule_batch(
    State(state): State<AppState>,
    Json(entries): Json<Vec<serde_json::Value>>,
) -> Json<BatchScheduleResponse> {
    let policy = state.config.apns.topic_policy();
    let mut scheduled = 0;
    let mut rejected = 0;

    for entry in entries {
        let request: PushRequest = match serde_json::from_value(entry) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable batch entry");
                rejected += 1;
                continue;
            }
        };

        if !policy.allows(&request.topic) {
            tracing::warn!(id = %request.id, topic = %request.topic, "Skipping batch entry with disallowed topic");
            rejected += 1;
            continue;
        }

        match state.scheduler.schedule(&request).await {
            Ok(()) => scheduled += 1,
            Err(e) => {
                tracing::error!(id = %request.id, error = %e, "Failed to schedule batch entry");
                rejected += 1;
            }
        }
    }

    Json(BatchScheduleResponse { scheduled, rejected })
}
