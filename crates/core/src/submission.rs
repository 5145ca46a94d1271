use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::applicant::ApplicantFields;
use crate::pricing::PricingResolver;
use crate::selection::SelectionState;
use crate::validation::needs_schedule;

pub const SUCCESS_MESSAGE: &str =
    "Thank you! Your application has been received. We will contact you shortly.";
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while submitting your application. Please try again.";

/// Flat record handed to the intake endpoint. Every key is always present;
/// schedule fields are empty strings when the offering is not scheduled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPayload {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub preferred_date: String,
    pub preferred_time: String,
    pub course_type: String,
    pub course_type_id: String,
    pub package_title: String,
    pub package_id: String,
    pub lessons: u32,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub display_total_price: String,
    pub display_price_per_lesson: String,
}

impl ApplicationPayload {
    /// `None` when the selection does not resolve to a category and bundle.
    pub fn build(
        fields: &ApplicantFields,
        selection: &SelectionState,
        pricing: &PricingResolver,
    ) -> Option<Self> {
        let category = selection.current_category()?;
        let bundle = selection.current_bundle()?;
        let price = pricing.resolve(bundle, selection.currency());
        let (preferred_date, preferred_time) = if needs_schedule(selection) {
            (fields.preferred_date.clone(), fields.preferred_time.clone())
        } else {
            (String::new(), String::new())
        };

        Some(Self {
            full_name: fields.full_name.clone(),
            email: fields.email.clone(),
            phone: fields.phone.clone(),
            country: fields.country.clone(),
            preferred_date,
            preferred_time,
            course_type: category.title.clone(),
            course_type_id: category.id.to_string(),
            package_title: bundle.title.clone(),
            package_id: bundle.id.to_string(),
            lessons: bundle.unit_count,
            currency: price.currency.to_string(),
            total_price: price.total,
            display_total_price: price.display_total,
            display_price_per_lesson: price.display_per_unit,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    Accepted,
    /// Intake refused the application; carries the raw response body.
    Rejected(Value),
    TransportFailure(Option<String>),
}

#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, payload: &ApplicationPayload) -> DeliveryOutcome;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionResult {
    #[default]
    Idle,
    InFlight,
    Success(String),
    Failure(String),
}

impl SubmissionResult {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(message) | Self::Failure(message) => Some(message),
            Self::Idle | Self::InFlight => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InFlight => "in_flight",
            Self::Success(_) => "success",
            Self::Failure(_) => "failure",
        }
    }
}

impl From<DeliveryOutcome> for SubmissionResult {
    fn from(outcome: DeliveryOutcome) -> Self {
        match outcome {
            DeliveryOutcome::Accepted => Self::Success(SUCCESS_MESSAGE.to_string()),
            DeliveryOutcome::Rejected(body) => Self::Failure(
                first_error_message(&body).unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            ),
            DeliveryOutcome::TransportFailure(diagnostic) => Self::Failure(
                diagnostic
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            ),
        }
    }
}

/// Reads `errors[0].message` from an intake rejection body.
pub fn first_error_message(body: &Value) -> Option<String> {
    body.get("errors")?
        .as_array()?
        .first()?
        .get("message")?
        .as_str()
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionTicket {
    pub sequence: u64,
    pub payload: ApplicationPayload,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionDisposition {
    Applied,
    /// A newer attempt or a reset superseded this one; its outcome was dropped.
    Stale,
}

/// Owns the result slot. Each attempt gets a fresh sequence number and only
/// the latest one may write its outcome.
#[derive(Clone, Debug, Default)]
pub struct SubmissionController {
    result: SubmissionResult,
    latest_sequence: u64,
}

impl SubmissionController {
    pub fn result(&self) -> &SubmissionResult {
        &self.result
    }

    pub fn is_in_flight(&self) -> bool {
        self.result.is_in_flight()
    }

    pub fn latest_sequence(&self) -> u64 {
        self.latest_sequence
    }

    pub fn begin(
        &mut self,
        fields: &ApplicantFields,
        selection: &SelectionState,
        pricing: &PricingResolver,
    ) -> Option<SubmissionTicket> {
        let Some(payload) = ApplicationPayload::build(fields, selection, pricing) else {
            warn!(
                event_name = "submission.refused",
                reason = "incomplete_selection",
                "submission ignored without a resolved category and bundle"
            );
            return None;
        };

        self.latest_sequence += 1;
        self.result = SubmissionResult::InFlight;
        info!(
            event_name = "submission.started",
            sequence = self.latest_sequence,
            category_id = %payload.course_type_id,
            bundle_id = %payload.package_id,
            currency = %payload.currency,
            "application submission started"
        );

        Some(SubmissionTicket { sequence: self.latest_sequence, payload })
    }

    pub fn complete(&mut self, sequence: u64, outcome: DeliveryOutcome) -> CompletionDisposition {
        if sequence != self.latest_sequence || !self.result.is_in_flight() {
            info!(
                event_name = "submission.stale_discarded",
                sequence,
                latest_sequence = self.latest_sequence,
                "late submission outcome discarded"
            );
            return CompletionDisposition::Stale;
        }

        self.result = SubmissionResult::from(outcome);
        info!(
            event_name = "submission.completed",
            sequence,
            outcome = self.result.kind(),
            "application submission finished"
        );
        CompletionDisposition::Applied
    }

    /// Clears the slot and invalidates any attempt still in flight.
    pub fn reset(&mut self) {
        self.latest_sequence += 1;
        self.result = SubmissionResult::Idle;
    }

    /// Single attempt, no retry. A no-op when the selection is incomplete.
    pub async fn submit(
        &mut self,
        fields: &ApplicantFields,
        selection: &SelectionState,
        pricing: &PricingResolver,
        delivery: &dyn Delivery,
    ) -> SubmissionResult {
        if let Some(ticket) = self.begin(fields, selection, pricing) {
            let outcome = delivery.deliver(&ticket.payload).await;
            self.complete(ticket.sequence, outcome);
        }
        self.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{
        first_error_message, ApplicationPayload, CompletionDisposition, Delivery, DeliveryOutcome,
        SubmissionController, SubmissionResult, GENERIC_FAILURE_MESSAGE, SUCCESS_MESSAGE,
    };
    use crate::catalog::Catalog;
    use crate::domain::applicant::ApplicantFields;
    use crate::domain::currency::CurrencyCode;
    use crate::domain::offering::{BundleId, CategoryId};
    use crate::pricing::PricingResolver;
    use crate::selection::SelectionState;

    struct FixedDelivery {
        outcome: DeliveryOutcome,
        seen: Mutex<Vec<ApplicationPayload>>,
    }

    impl FixedDelivery {
        fn new(outcome: DeliveryOutcome) -> Self {
            Self { outcome, seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl Delivery for FixedDelivery {
        async fn deliver(&self, payload: &ApplicationPayload) -> DeliveryOutcome {
            self.seen.lock().expect("lock").push(payload.clone());
            self.outcome.clone()
        }
    }

    fn selection(category: &str, bundle: &str, currency: &str) -> SelectionState {
        let mut state = SelectionState::new(Arc::new(Catalog::builtin()), CurrencyCode::usd());
        state.select_category(CategoryId::from(category));
        state.select_bundle(BundleId::from(bundle)).expect("bundle belongs to category");
        state.set_currency(CurrencyCode::new(currency));
        state
    }

    fn fields() -> ApplicantFields {
        ApplicantFields {
            full_name: "Omar Saleh".to_string(),
            email: "omar@example.com".to_string(),
            phone: "+1 555 0100".to_string(),
            country: "United States".to_string(),
            preferred_date: "2026-11-10".to_string(),
            preferred_time: "09:00".to_string(),
        }
    }

    #[test]
    fn payload_blanks_schedule_for_multi_lesson_bundles() {
        let payload = ApplicationPayload::build(
            &fields(),
            &selection("main", "main-10", "KWD"),
            &PricingResolver::default(),
        )
        .expect("selection resolves");

        assert_eq!(payload.preferred_date, "");
        assert_eq!(payload.preferred_time, "");
        assert_eq!(payload.lessons, 10);
        assert_eq!(payload.currency, "KWD");
        assert_eq!(payload.total_price, Decimal::new(42, 0));
        assert_eq!(payload.display_total_price, "42 KWD");
        assert_eq!(payload.display_price_per_lesson, "4.200 KWD per lesson");
    }

    #[test]
    fn payload_keys_are_stable_and_total_is_numeric() {
        let payload = ApplicationPayload::build(
            &fields(),
            &selection("main", "main-20", "USD"),
            &PricingResolver::default(),
        )
        .expect("selection resolves");
        let value = serde_json::to_value(&payload).expect("payload serializes");

        for key in [
            "fullName",
            "email",
            "phone",
            "country",
            "preferredDate",
            "preferredTime",
            "courseType",
            "courseTypeId",
            "packageTitle",
            "packageId",
            "lessons",
            "currency",
            "totalPrice",
            "displayTotalPrice",
            "displayPricePerLesson",
        ] {
            assert!(value.get(key).is_some(), "missing payload key {key}");
        }
        assert_eq!(value["preferredDate"], "");
        assert_eq!(value["totalPrice"], json!(260.0));
        assert_eq!(value["courseType"], "Structured Course");
    }

    #[test]
    fn payload_keeps_schedule_for_trial() {
        let payload = ApplicationPayload::build(
            &fields(),
            &selection("trial", "trial-lesson", "USD"),
            &PricingResolver::default(),
        )
        .expect("selection resolves");

        assert_eq!(payload.preferred_date, "2026-11-10");
        assert_eq!(payload.display_total_price, "Free");
    }

    #[test]
    fn first_error_message_handles_malformed_bodies() {
        assert_eq!(
            first_error_message(&json!({"errors": [{"message": "Invalid email"}]})),
            Some("Invalid email".to_string())
        );
        assert_eq!(first_error_message(&json!({"errors": []})), None);
        assert_eq!(first_error_message(&json!({"errors": "nope"})), None);
        assert_eq!(first_error_message(&json!({"errors": [{"code": 42}]})), None);
        assert_eq!(first_error_message(&json!(null)), None);
    }

    #[test]
    fn outcomes_map_to_results() {
        assert_eq!(
            SubmissionResult::from(DeliveryOutcome::Accepted),
            SubmissionResult::Success(SUCCESS_MESSAGE.to_string())
        );
        assert_eq!(
            SubmissionResult::from(DeliveryOutcome::Rejected(json!("<html>"))),
            SubmissionResult::Failure(GENERIC_FAILURE_MESSAGE.to_string())
        );
        assert_eq!(
            SubmissionResult::from(DeliveryOutcome::TransportFailure(Some(
                "connection refused".to_string()
            ))),
            SubmissionResult::Failure("connection refused".to_string())
        );
        assert_eq!(
            SubmissionResult::from(DeliveryOutcome::TransportFailure(None)),
            SubmissionResult::Failure(GENERIC_FAILURE_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn submit_success_clears_in_flight() {
        let mut controller = SubmissionController::default();
        let delivery = FixedDelivery::new(DeliveryOutcome::Accepted);

        let result = controller
            .submit(
                &fields(),
                &selection("main", "main-single", "USD"),
                &PricingResolver::default(),
                &delivery,
            )
            .await;

        assert_eq!(result, SubmissionResult::Success(SUCCESS_MESSAGE.to_string()));
        assert!(!controller.is_in_flight());
        assert_eq!(delivery.seen.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn submit_is_a_noop_without_a_bundle() {
        let mut controller = SubmissionController::default();
        let delivery = FixedDelivery::new(DeliveryOutcome::Accepted);
        let mut state = SelectionState::new(Arc::new(Catalog::builtin()), CurrencyCode::usd());
        state.select_category(CategoryId::from("main"));

        let result =
            controller.submit(&fields(), &state, &PricingResolver::default(), &delivery).await;

        assert_eq!(result, SubmissionResult::Idle);
        assert!(delivery.seen.lock().expect("lock").is_empty());
    }

    #[test]
    fn new_attempt_discards_previous_error_and_late_outcome() {
        let mut controller = SubmissionController::default();
        let pricing = PricingResolver::default();
        let state = selection("main", "main-10", "USD");

        let first = controller.begin(&fields(), &state, &pricing).expect("first ticket");
        controller.complete(first.sequence, DeliveryOutcome::TransportFailure(None));
        assert!(matches!(controller.result(), SubmissionResult::Failure(_)));

        let second = controller.begin(&fields(), &state, &pricing).expect("second ticket");
        assert_eq!(controller.result(), &SubmissionResult::InFlight);

        assert_eq!(
            controller.complete(first.sequence, DeliveryOutcome::Accepted),
            CompletionDisposition::Stale
        );
        assert_eq!(
            controller.complete(second.sequence, DeliveryOutcome::Accepted),
            CompletionDisposition::Applied
        );
        assert_eq!(controller.result(), &SubmissionResult::Success(SUCCESS_MESSAGE.to_string()));
    }

    #[test]
    fn reset_invalidates_in_flight_attempt() {
        let mut controller = SubmissionController::default();
        let ticket = controller
            .begin(&fields(), &selection("main", "main-10", "USD"), &PricingResolver::default())
            .expect("ticket");

        controller.reset();

        assert_eq!(
            controller.complete(ticket.sequence, DeliveryOutcome::Accepted),
            CompletionDisposition::Stale
        );
        assert_eq!(controller.result(), &SubmissionResult::Idle);
    }
}
