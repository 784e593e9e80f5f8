use crate::adapters::push::{ApnsMessage, ApnsRequest, GatewayError, PushGateway};
use crate::domain::push::{Message, PushRequest};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unsupported message type: {0}")]
    UnsupportedMessage(String),
    #[error("Delivery failed: {0}")]
    Delivery(#[from] GatewayError),
}

/// Converts a decoded push request into a gateway call. Makes exactly one
/// outbound call per invocation; retry policy, if any, belongs to the caller.
#[derive(Debug, Clone)]
pub struct PushDispatcher {
    gateway: Arc<dyn PushGateway>,
}

impl PushDispatcher {
    #[must_use]
    pub fn new(gateway: Arc<dyn PushGateway>) -> Self {
        Self { gateway }
    }

    /// Maps the request's message onto a gateway message shape and sends it.
    ///
    /// # Errors
    /// Returns `DispatchError::UnsupportedMessage` for message forms the
    /// gateway vocabulary does not cover, or `DispatchError::Delivery` if the
    /// gateway call fails.
    pub async fn deliver(&self, request: &PushRequest) -> Result<(), DispatchError> {
        let message = match &request.message {
            Message::Background => ApnsMessage::Background { expiration: request.expiration },
            Message::Alert(title) => ApnsMessage::Alert {
                title: title.clone(),
                expiration: request.expiration,
                priority: request.priority,
            },
            Message::LiveActivity(activity) => ApnsMessage::LiveActivity {
                event: activity.event,
                content_state: activity.content_state.clone(),
            },
            Message::Other(value) => {
                return Err(DispatchError::UnsupportedMessage(value.to_string()));
            }
        };

        let outbound = ApnsRequest {
            message,
            device_token: request.device_token.clone(),
            push_type: request.push_type,
            expiration: request.expiration,
            priority: request.priority,
            apns_id: request.apns_id,
            topic: request.topic.clone(),
            collapse_id: request.collapse_id.clone(),
        };

        self.gateway.send_push(&outbound).await?;
        Ok(())
    }
}
