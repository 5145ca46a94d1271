use clap::Args;
use enrollo_core::audit::InMemoryAuditSink;
use enrollo_core::domain::applicant::ApplicantField;
use enrollo_core::errors::ApplicationError;
use enrollo_core::flows::WizardEvent;
use enrollo_core::submission::{Delivery, SubmissionResult};
use enrollo_intake::{HttpIntakeDelivery, RecordingDelivery};
use uuid::Uuid;

use crate::commands::{
    drive_to_details, load_config, log_audit_trail, open_session, CommandResult, SelectionArgs,
};

#[derive(Debug, Clone, Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
    #[arg(long)]
    pub full_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub country: String,
    #[arg(long, help = "Required for trial and placement offerings")]
    pub preferred_date: Option<String>,
    #[arg(long, help = "Required for trial and placement offerings")]
    pub preferred_time: Option<String>,
    #[arg(long, help = "Record the payload locally instead of posting it")]
    pub dry_run: bool,
}

pub fn run(args: &ApplyArgs) -> CommandResult {
    let config = match load_config("apply") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let mut session = match open_session("apply", &config, args.selection.currency.as_deref()) {
        Ok(session) => session,
        Err(result) => return result,
    };

    let correlation_id = Uuid::new_v4().to_string();
    let sink = InMemoryAuditSink::default();
    let driven = drive_to_details(&mut session, &args.selection, &sink, &correlation_id)
        .and_then(|()| {
            session
                .apply_with_audit(WizardEvent::Proceed, &sink, &correlation_id)
                .map(|_| ())
                .map_err(ApplicationError::from)
        });
    if let Err(error) = driven {
        log_audit_trail(&sink);
        return CommandResult::from_error("apply", &error);
    }

    session.set_field(ApplicantField::FullName, args.full_name.as_str());
    session.set_field(ApplicantField::Email, args.email.as_str());
    session.set_field(ApplicantField::Phone, args.phone.as_str());
    session.set_field(ApplicantField::Country, args.country.as_str());
    if let Some(date) = &args.preferred_date {
        session.set_field(ApplicantField::PreferredDate, date.as_str());
    }
    if let Some(time) = &args.preferred_time {
        session.set_field(ApplicantField::PreferredTime, time.as_str());
    }

    if !session.is_ready_to_submit() {
        let missing: Vec<&str> =
            session.missing_fields().iter().map(ApplicantField::as_str).collect();
        log_audit_trail(&sink);
        return CommandResult::failure(
            "apply",
            "validation",
            format!("missing required fields: {}", missing.join(", ")),
            3,
        );
    }

    let recorder = RecordingDelivery::default();
    let delivery: Box<dyn Delivery> = if args.dry_run {
        Box::new(recorder.clone())
    } else {
        match HttpIntakeDelivery::new(&config.intake) {
            Ok(delivery) => Box::new(delivery),
            Err(error) => {
                let error = ApplicationError::Configuration(error.to_string());
                return CommandResult::from_error("apply", &error);
            }
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "apply",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                4,
            );
        }
    };

    let result = runtime.block_on(session.submit_with_audit(
        delivery.as_ref(),
        &sink,
        &correlation_id,
    ));
    log_audit_trail(&sink);

    match result {
        SubmissionResult::Success(message) if args.dry_run => {
            let payload = recorder
                .payloads()
                .last()
                .and_then(|payload| serde_json::to_string(payload).ok())
                .unwrap_or_default();
            CommandResult::success("apply", format!("{message}\npayload: {payload}"))
        }
        SubmissionResult::Success(message) => CommandResult::success("apply", message),
        SubmissionResult::Failure(message) => {
            let error = ApplicationError::Integration(message.clone());
            CommandResult::failure("apply", error.error_class(), message, error.exit_code())
        }
        SubmissionResult::Idle | SubmissionResult::InFlight => CommandResult::failure(
            "apply",
            "integration",
            "submission did not produce an outcome",
            4,
        ),
    }
}
