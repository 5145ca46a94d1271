//! Delivery collaborators for finished applications.
//!
//! `HttpIntakeDelivery` posts the payload to the configured intake endpoint.
//! `RecordingDelivery` keeps payloads in memory for dry runs and tests.

pub mod http;
pub mod recording;

use thiserror::Error;

pub use http::HttpIntakeDelivery;
pub use recording::RecordingDelivery;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("intake endpoint is not configured")]
    NotConfigured,
    #[error("failed to build intake http client: {0}")]
    Client(#[from] reqwest::Error),
}
