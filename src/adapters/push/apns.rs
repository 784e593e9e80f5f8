use crate::adapters::push::{ApnsRequest, GatewayError, PushGateway};
use crate::config::{ApnsConfig, ApnsEnvironment};
use async_trait::async_trait;

/// Gateway client bound to one signing identity and environment. The actual
/// TLS/JWT wire protocol lives outside this crate; this implementation logs
/// the send so the full scheduling pipeline can run without credentials.
#[derive(Debug)]
pub struct ApnsClient {
    environment: ApnsEnvironment,
    key_identifier: String,
    team_identifier: String,
}

impl ApnsClient {
    #[must_use]
    pub fn new(config: &ApnsConfig) -> Self {
        Self {
            environment: config.environment,
            key_identifier: config.key_identifier.clone(),
            team_identifier: config.team_identifier.clone(),
        }
    }
}

#[async_trait]
impl PushGateway for ApnsClient {
    async fn send_push(&self, request: &ApnsRequest) -> Result<(), GatewayError> {
        tracing::info!(
            device_token = %request.device_token,
            topic = %request.topic,
            push_type = ?request.push_type,
            environment = ?self.environment,
            key = %self.key_identifier,
            team = %self.team_identifier,
            "STUB: Sending APNs push notification"
        );
        Ok(())
    }
}
