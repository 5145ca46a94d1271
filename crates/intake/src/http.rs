use std::time::Duration;

use async_trait::async_trait;
use enrollo_core::config::IntakeConfig;
use enrollo_core::submission::{ApplicationPayload, Delivery, DeliveryOutcome};
use reqwest::header::ACCEPT;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};

use crate::IntakeError;

pub struct HttpIntakeDelivery {
    client: Client,
    endpoint: String,
    api_token: Option<SecretString>,
}

impl HttpIntakeDelivery {
    pub fn new(config: &IntakeConfig) -> Result<Self, IntakeError> {
        if !config.is_configured() {
            return Err(IntakeError::NotConfigured);
        }

        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim().to_string(),
            api_token: config.api_token.clone(),
        })
    }
}

#[async_trait]
impl Delivery for HttpIntakeDelivery {
    async fn deliver(&self, payload: &ApplicationPayload) -> DeliveryOutcome {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .json(payload);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    event_name = "intake.request.failed",
                    endpoint = %self.endpoint,
                    timeout = error.is_timeout(),
                    error = %error,
                    "intake request did not complete"
                );
                return DeliveryOutcome::TransportFailure(Some(error.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(
                event_name = "intake.request.accepted",
                status = status.as_u16(),
                "intake accepted application"
            );
            return DeliveryOutcome::Accepted;
        }

        // Non-JSON error pages still count as a rejection, just without detail.
        let body = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null),
            Err(_) => Value::Null,
        };
        warn!(
            event_name = "intake.request.failed",
            endpoint = %self.endpoint,
            status = status.as_u16(),
            has_body = !body.is_null(),
            "intake rejected application"
        );
        DeliveryOutcome::Rejected(body)
    }
}
