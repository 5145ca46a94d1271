pub mod apply;
pub mod catalog;
pub mod config;
pub mod quote;

use std::sync::Arc;

use clap::Args;
use enrollo_core::audit::{AuditSink, InMemoryAuditSink};
use enrollo_core::config::{AppConfig, LoadOptions};
use enrollo_core::domain::currency::CurrencyCode;
use enrollo_core::domain::offering::{BundleId, CategoryId};
use enrollo_core::errors::ApplicationError;
use enrollo_core::flows::{WizardEvent, WizardSession};
use enrollo_core::pricing::PricingResolver;
use serde::Serialize;
use tracing::debug;

/// Offering picked on the command line.
#[derive(Debug, Clone, Args)]
pub struct SelectionArgs {
    #[arg(long, help = "Category id, e.g. main or trial")]
    pub category: String,
    #[arg(long, help = "Bundle id within the category, e.g. main-10")]
    pub bundle: String,
    #[arg(long, help = "Display currency code (unknown codes fall back to USD)")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(command, error.error_class(), error.to_string(), error.exit_code())
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            concat!(
                "{{\"command\":\"unknown\",\"status\":\"error\",",
                "\"error_class\":\"serialization\",\"message\":\"{}\"}}"
            ),
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::from_error(command, &ApplicationError::Configuration(error.to_string()))
    })
}

/// Fresh wizard session over the configured catalog. `currency` wins over the
/// configured default when given.
pub(crate) fn open_session(
    command: &str,
    config: &AppConfig,
    currency: Option<&str>,
) -> Result<WizardSession, CommandResult> {
    let catalog = config.load_catalog().map_err(|error| {
        CommandResult::from_error(command, &ApplicationError::Catalog(error.to_string()))
    })?;

    let mut session = WizardSession::new(
        Arc::new(catalog),
        PricingResolver::default(),
        config.default_currency(),
    );
    if let Some(currency) = currency {
        session.set_currency(CurrencyCode::new(currency));
    }
    Ok(session)
}

/// Walks a fresh session from the category step to the details step.
pub(crate) fn drive_to_details<S>(
    session: &mut WizardSession,
    selection: &SelectionArgs,
    sink: &S,
    correlation_id: &str,
) -> Result<(), ApplicationError>
where
    S: AuditSink + ?Sized,
{
    session.apply_with_audit(
        WizardEvent::SelectCategory(CategoryId::from(selection.category.as_str())),
        sink,
        correlation_id,
    )?;
    session.apply_with_audit(
        WizardEvent::SelectBundle(BundleId::from(selection.bundle.as_str())),
        sink,
        correlation_id,
    )?;
    Ok(())
}

pub(crate) fn log_audit_trail(sink: &InMemoryAuditSink) {
    for event in sink.events() {
        debug!(
            event_name = "audit.event",
            audit_event_type = %event.event_type,
            category = ?event.category,
            outcome = ?event.outcome,
            correlation_id = %event.correlation_id,
            session_id = event.session_id.as_ref().map(|id| id.0.as_str()).unwrap_or("none"),
            "audit event recorded"
        );
    }
}
