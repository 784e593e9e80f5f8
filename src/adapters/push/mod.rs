use crate::domain::push::{Expiration, LiveActivityEvent, Priority, PushType};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod apns;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Device token rejected by the push gateway")]
    BadDeviceToken,
    #[error("External service error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Message shapes the gateway understands. The dispatcher is responsible for
/// mapping the wire-level [`crate::domain::push::Message`] union onto one of
/// these exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum ApnsMessage {
    Background {
        expiration: Expiration,
    },
    Alert {
        title: String,
        expiration: Expiration,
        priority: Priority,
    },
    LiveActivity {
        event: LiveActivityEvent,
        content_state: serde_json::Value,
    },
}

/// One outbound notification, fully resolved for the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct ApnsRequest {
    pub message: ApnsMessage,
    pub device_token: String,
    pub push_type: PushType,
    pub expiration: Expiration,
    pub priority: Priority,
    pub apns_id: Option<Uuid>,
    pub topic: String,
    pub collapse_id: Option<String>,
}

#[async_trait]
pub trait PushGateway: Send + Sync + std::fmt::Debug {
    /// Transmits a single notification to the remote push service.
    ///
    /// # Errors
    /// Returns `GatewayError::BadDeviceToken` if the token was rejected, or
    /// `GatewayError::Other` for transport failures.
    async fn send_push(&self, request: &ApnsRequest) -> Result<(), GatewayError>;
}
