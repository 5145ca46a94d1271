use enrollo_core::audit::InMemoryAuditSink;
use enrollo_core::errors::{ApplicationError, DomainError};
use uuid::Uuid;

use crate::commands::{
    drive_to_details, load_config, log_audit_trail, open_session, CommandResult, SelectionArgs,
};

pub fn run(selection: &SelectionArgs) -> CommandResult {
    let config = match load_config("quote") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let mut session = match open_session("quote", &config, selection.currency.as_deref()) {
        Ok(session) => session,
        Err(result) => return result,
    };

    let correlation_id = Uuid::new_v4().to_string();
    let sink = InMemoryAuditSink::default();
    let driven = drive_to_details(&mut session, selection, &sink, &correlation_id);
    let quote = driven.and_then(|()| {
        session.quote_with_audit(&sink, &correlation_id).ok_or_else(|| {
            ApplicationError::Domain(DomainError::InvariantViolation(
                "details step reached without a resolved bundle".to_string(),
            ))
        })
    });
    log_audit_trail(&sink);

    let quote = match quote {
        Ok(quote) => quote,
        Err(error) => return CommandResult::from_error("quote", &error),
    };

    let lines = [
        format!("category: {} ({})", quote.category.title, quote.category.id),
        format!("bundle: {} ({})", quote.bundle.title, quote.bundle.id),
        format!("lessons: {}", quote.bundle.unit_count),
        format!("currency: {}", quote.price.currency),
        format!("total: {}", quote.price.display_total),
        format!("per lesson: {}", quote.price.display_per_unit),
        format!("needs schedule: {}", if quote.needs_schedule { "yes" } else { "no" }),
        format!("step: {}", session.step()),
    ];
    CommandResult::success("quote", lines.join("\n"))
}
