use crate::config::Config;
use crate::services::scheduler::PushScheduler;
use axum::body::Body;
use axum::http::Request;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod cancel;
pub mod health;
pub mod schedule;
pub mod schemas;
pub mod status;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub scheduler: Arc<PushScheduler>,
}

/// Configures and returns the application router.
pub fn app_router(config: Config, scheduler: Arc<PushScheduler>) -> Router {
    let state = AppState { config, scheduler };

    Router::new()
        .route("/ping", get(health::ping))
        .route("/schedule", post(schedule::schedule))
        .route("/schedule/batch", post(schedule::schedule_batch))
        .route("/status/{id}", get(status::status))
        .route("/status/batch", post(status::status_batch))
        .route("/cancel/{id}", post(cancel::cancel))
        .layer(PropagateRequestIdLayer::new(axum::http::HeaderName::from_static("x-request-id")))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, _span: &tracing::Span| {
                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %response.status().as_u16(),
                            "request completed"
                        );
                    },
                ),
        )
        .layer(SetRequestIdLayer::new(
            axum::http::HeaderName::from_static("x-request-id"),
            MakeRequestUuid,
        ))
        .with_state(state)
}
