//! One applicant's pass through the enrollment wizard.
//!
//! `WizardSession` is the surface a UI renders from: current step, resolved
//! selection and prices, form values, readiness, and the submission slot.
//! All mutation goes through `apply`, the field/currency setters, and the
//! submission calls.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::catalog::Catalog;
use crate::domain::applicant::{ApplicantField, ApplicantFields};
use crate::domain::currency::CurrencyCode;
use crate::domain::offering::{BundleDefinition, CategoryDefinition};
use crate::flows::engine::{EnrollmentFlow, FlowEngine, WizardTransitionError};
use crate::flows::states::{FlowAction, FlowContext, TransitionOutcome, WizardEvent, WizardStep};
use crate::pricing::{PricingResolver, ResolvedPrice};
use crate::selection::{Selection, SelectionState};
use crate::submission::{
    CompletionDisposition, Delivery, DeliveryOutcome, SubmissionController, SubmissionResult,
    SubmissionTicket,
};
use crate::validation;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved display data for the current selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteView {
    pub category: CategoryDefinition,
    pub bundle: BundleDefinition,
    pub price: ResolvedPrice,
    pub needs_schedule: bool,
}

pub struct WizardSession {
    id: SessionId,
    engine: FlowEngine<EnrollmentFlow>,
    pricing: PricingResolver,
    selection: SelectionState,
    fields: ApplicantFields,
    step: WizardStep,
    submission: SubmissionController,
}

impl WizardSession {
    pub fn new(
        catalog: Arc<Catalog>,
        pricing: PricingResolver,
        default_currency: CurrencyCode,
    ) -> Self {
        let engine = FlowEngine::default();
        Self {
            id: SessionId::generate(),
            step: engine.initial_step(),
            engine,
            pricing,
            selection: SelectionState::new(catalog, default_currency),
            fields: ApplicantFields::default(),
            submission: SubmissionController::default(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn catalog(&self) -> &Catalog {
        self.selection.catalog()
    }

    pub fn pricing(&self) -> &PricingResolver {
        &self.pricing
    }

    pub fn selection(&self) -> &Selection {
        self.selection.selection()
    }

    pub fn currency(&self) -> &CurrencyCode {
        self.selection.currency()
    }

    pub fn fields(&self) -> &ApplicantFields {
        &self.fields
    }

    pub fn current_category(&self) -> Option<&CategoryDefinition> {
        self.selection.current_category()
    }

    pub fn current_bundle(&self) -> Option<&BundleDefinition> {
        self.selection.current_bundle()
    }

    pub fn quote(&self) -> Option<QuoteView> {
        let category = self.selection.current_category()?;
        let bundle = self.selection.current_bundle()?;
        Some(QuoteView {
            category: category.clone(),
            bundle: bundle.clone(),
            price: self.pricing.resolve(bundle, self.selection.currency()),
            needs_schedule: validation::needs_schedule(&self.selection),
        })
    }

    /// Like `quote`, but records the resolution in the audit trail.
    pub fn quote_with_audit<S>(&self, sink: &S, correlation_id: &str) -> Option<QuoteView>
    where
        S: AuditSink + ?Sized,
    {
        let quote = self.quote()?;
        let requested = self.selection.currency();
        sink.emit(
            AuditEvent::new(
                &self.audit_context(correlation_id),
                "pricing.quote_resolved",
                AuditCategory::Pricing,
                AuditOutcome::Success,
            )
            .with_metadata("bundle_id", quote.bundle.id.to_string())
            .with_metadata("requested_currency", requested.to_string())
            .with_metadata("currency", quote.price.currency.to_string())
            .with_metadata("display_total", quote.price.display_total.clone()),
        );
        Some(quote)
    }

    pub fn needs_schedule(&self) -> bool {
        validation::needs_schedule(&self.selection)
    }

    pub fn missing_fields(&self) -> Vec<ApplicantField> {
        validation::missing_fields(&self.fields, &self.selection)
    }

    pub fn is_ready_to_submit(&self) -> bool {
        validation::is_ready_to_submit(&self.fields, &self.selection)
    }

    pub fn submission_result(&self) -> &SubmissionResult {
        self.submission.result()
    }

    pub fn is_in_flight(&self) -> bool {
        self.submission.is_in_flight()
    }

    pub fn set_currency(&mut self, currency: CurrencyCode) {
        self.selection.set_currency(currency);
    }

    pub fn set_field(&mut self, field: ApplicantField, value: impl Into<String>) {
        self.fields.set(field, value);
    }

    /// Applies one navigation event. On error nothing changes.
    pub fn apply(
        &mut self,
        event: WizardEvent,
    ) -> Result<TransitionOutcome, WizardTransitionError> {
        let context = FlowContext::new(self.selection.catalog(), self.selection.selection());
        let outcome = self.engine.apply(self.step, &event, &context)?;
        self.commit(&outcome)?;
        Ok(outcome)
    }

    pub fn apply_with_audit<S>(
        &mut self,
        event: WizardEvent,
        sink: &S,
        correlation_id: &str,
    ) -> Result<TransitionOutcome, WizardTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let audit = self.audit_context(correlation_id);
        let context = FlowContext::new(self.selection.catalog(), self.selection.selection());
        let outcome = self.engine.apply_with_audit(self.step, &event, &context, sink, &audit)?;
        self.commit(&outcome)?;
        Ok(outcome)
    }

    fn commit(&mut self, outcome: &TransitionOutcome) -> Result<(), WizardTransitionError> {
        for action in &outcome.actions {
            match action {
                FlowAction::RecordCategory(category_id) => {
                    self.selection.select_category(category_id.clone());
                }
                FlowAction::RecordBundle(bundle_id) => {
                    self.selection.select_bundle(bundle_id.clone())?;
                }
                FlowAction::ClearBundle => self.selection.clear_bundle(),
                FlowAction::ClearSession => self.clear(),
            }
        }

        self.step = outcome.to;
        info!(
            event_name = "wizard.transition.applied",
            session_id = %self.id,
            from = outcome.from.as_str(),
            to = outcome.to.as_str(),
            "wizard step changed"
        );
        Ok(())
    }

    fn clear(&mut self) {
        self.selection.reset();
        self.fields = ApplicantFields::default();
        self.submission.reset();
        debug!(
            event_name = "wizard.session.cleared",
            session_id = %self.id,
            "session state cleared"
        );
    }

    /// Starts an attempt; `None` when the selection is incomplete. The caller
    /// delivers the ticket's payload and reports back through
    /// `complete_submission`.
    pub fn begin_submission(&mut self) -> Option<SubmissionTicket> {
        self.submission.begin(&self.fields, &self.selection, &self.pricing)
    }

    pub fn complete_submission(
        &mut self,
        sequence: u64,
        outcome: DeliveryOutcome,
    ) -> CompletionDisposition {
        self.submission.complete(sequence, outcome)
    }

    pub async fn submit(&mut self, delivery: &dyn Delivery) -> SubmissionResult {
        self.submission.submit(&self.fields, &self.selection, &self.pricing, delivery).await
    }

    pub async fn submit_with_audit<S>(
        &mut self,
        delivery: &dyn Delivery,
        sink: &S,
        correlation_id: &str,
    ) -> SubmissionResult
    where
        S: AuditSink + ?Sized,
    {
        let audit = self.audit_context(correlation_id);
        let result = self.submit(delivery).await;
        let outcome = match &result {
            SubmissionResult::Success(_) => AuditOutcome::Success,
            SubmissionResult::Failure(_) => AuditOutcome::Failed,
            SubmissionResult::Idle | SubmissionResult::InFlight => AuditOutcome::Rejected,
        };
        let mut event =
            AuditEvent::new(&audit, "submission.finished", AuditCategory::Submission, outcome)
                .with_metadata("sequence", self.submission.latest_sequence().to_string());
        if let Some(quote) = self.quote() {
            event = event
                .with_metadata("bundle_id", quote.bundle.id.to_string())
                .with_metadata("currency", quote.price.currency.to_string())
                .with_metadata("total", quote.price.total.to_string());
        }
        sink.emit(event);
        result
    }

    fn audit_context(&self, correlation_id: &str) -> AuditContext {
        AuditContext::new(Some(self.id.clone()), correlation_id, "wizard")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    use super::WizardSession;
    use crate::audit::{AuditOutcome, InMemoryAuditSink};
    use crate::catalog::Catalog;
    use crate::domain::applicant::{ApplicantField, ApplicantFields};
    use crate::domain::currency::CurrencyCode;
    use crate::domain::offering::{BundleId, CategoryId};
    use crate::flows::engine::WizardTransitionError;
    use crate::flows::states::{WizardEvent, WizardStep};
    use crate::pricing::PricingResolver;
    use crate::submission::{
        ApplicationPayload, CompletionDisposition, Delivery, DeliveryOutcome, SubmissionResult,
        GENERIC_FAILURE_MESSAGE, SUCCESS_MESSAGE,
    };

    struct ScriptedDelivery {
        outcome: DeliveryOutcome,
        payloads: Mutex<Vec<ApplicationPayload>>,
    }

    impl ScriptedDelivery {
        fn new(outcome: DeliveryOutcome) -> Self {
            Self { outcome, payloads: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl Delivery for ScriptedDelivery {
        async fn deliver(&self, payload: &ApplicationPayload) -> DeliveryOutcome {
            self.payloads.lock().expect("lock").push(payload.clone());
            self.outcome.clone()
        }
    }

    fn session() -> WizardSession {
        WizardSession::new(
            Arc::new(Catalog::builtin()),
            PricingResolver::default(),
            CurrencyCode::usd(),
        )
    }

    fn walk_to_applying(session: &mut WizardSession, category: &str, bundle: &str) {
        session
            .apply(WizardEvent::SelectCategory(CategoryId::from(category)))
            .expect("select category");
        session.apply(WizardEvent::SelectBundle(BundleId::from(bundle))).expect("select bundle");
        session.apply(WizardEvent::Proceed).expect("proceed to apply");
    }

    fn fill_contact(session: &mut WizardSession) {
        session.set_field(ApplicantField::FullName, "Sara Nasser");
        session.set_field(ApplicantField::Email, "sara@example.com");
        session.set_field(ApplicantField::Phone, "+965 5000 1234");
        session.set_field(ApplicantField::Country, "Kuwait");
    }

    #[test]
    fn single_lesson_in_main_shows_usd_total_and_needs_schedule() {
        let mut session = session();
        session.apply(WizardEvent::SelectCategory(CategoryId::from("main"))).expect("category");
        session
            .apply(WizardEvent::SelectBundle(BundleId::from("main-single")))
            .expect("bundle");

        let quote = session.quote().expect("quote resolves");
        assert_eq!(quote.bundle.unit_count, 1);
        assert_eq!(quote.price.display_total, "$15");
        assert!(quote.needs_schedule);
        assert_eq!(session.step(), WizardStep::ReviewingDetails);
    }

    #[test]
    fn trial_shows_free_in_both_currencies() {
        let mut session = session();
        session.apply(WizardEvent::SelectCategory(CategoryId::from("trial"))).expect("category");
        session
            .apply(WizardEvent::SelectBundle(BundleId::from("trial-lesson")))
            .expect("bundle");

        assert_eq!(session.quote().expect("quote").price.display_total, "Free");
        session.set_currency(CurrencyCode::new("KWD"));
        assert_eq!(session.quote().expect("quote").price.display_total, "Free");
        assert!(session.needs_schedule());
    }

    #[test]
    fn changing_category_drops_bundle_selection() {
        let mut session = session();
        session.apply(WizardEvent::SelectCategory(CategoryId::from("main"))).expect("category");
        session.apply(WizardEvent::SelectBundle(BundleId::from("main-10"))).expect("bundle");
        session.apply(WizardEvent::Back).expect("details -> packages");
        session.apply(WizardEvent::Back).expect("packages -> type");
        session
            .apply(WizardEvent::SelectCategory(CategoryId::from("conversation")))
            .expect("category");

        assert_eq!(session.selection().bundle_id, None);
        assert!(session.current_bundle().is_none());
        assert_eq!(session.step(), WizardStep::ChoosingBundle);
    }

    #[test]
    fn rejected_transition_leaves_state_untouched() {
        let mut session = session();
        session.apply(WizardEvent::SelectCategory(CategoryId::from("trial"))).expect("category");

        let error = session
            .apply(WizardEvent::SelectBundle(BundleId::from("main-10")))
            .expect_err("bundle belongs to another category");

        assert!(matches!(error, WizardTransitionError::Selection(_)));
        assert_eq!(session.step(), WizardStep::ChoosingBundle);
        assert_eq!(session.selection().bundle_id, None);
    }

    #[test]
    fn reset_clears_everything_from_every_step() {
        for steps in 0..4 {
            let mut session = session();
            session.set_currency(CurrencyCode::new("KWD"));
            fill_contact(&mut session);
            let events = [
                WizardEvent::SelectCategory(CategoryId::from("placement")),
                WizardEvent::SelectBundle(BundleId::from("placement-test")),
                WizardEvent::Proceed,
            ];
            for event in events.into_iter().take(steps) {
                session.apply(event).expect("forward transition");
            }

            session.apply(WizardEvent::Reset).expect("reset applies");

            assert_eq!(session.step(), WizardStep::ChoosingCategory);
            assert_eq!(session.selection().category_id, None);
            assert_eq!(session.selection().bundle_id, None);
            assert_eq!(session.currency(), &CurrencyCode::usd());
            assert_eq!(session.fields(), &ApplicantFields::default());
            assert_eq!(session.submission_result(), &SubmissionResult::Idle);
        }
    }

    #[test]
    fn readiness_tracks_schedule_requirement() {
        let mut session = session();
        walk_to_applying(&mut session, "placement", "placement-test");
        fill_contact(&mut session);
        assert!(!session.is_ready_to_submit());
        assert_eq!(
            session.missing_fields(),
            vec![ApplicantField::PreferredDate, ApplicantField::PreferredTime]
        );

        session.set_field(ApplicantField::PreferredDate, "2026-11-03");
        session.set_field(ApplicantField::PreferredTime, "18:00");
        assert!(session.is_ready_to_submit());
    }

    #[tokio::test]
    async fn successful_delivery_sets_confirmation() {
        let mut session = session();
        walk_to_applying(&mut session, "main", "main-10");
        fill_contact(&mut session);
        let delivery = ScriptedDelivery::new(DeliveryOutcome::Accepted);

        let result = session.submit(&delivery).await;

        assert_eq!(result, SubmissionResult::Success(SUCCESS_MESSAGE.to_string()));
        assert!(!session.is_in_flight());
        let payloads = delivery.payloads.lock().expect("lock");
        assert_eq!(payloads[0].package_id, "main-10");
        assert_eq!(payloads[0].preferred_date, "");
    }

    #[tokio::test]
    async fn rejection_surfaces_first_error_message() {
        let mut session = session();
        walk_to_applying(&mut session, "main", "main-20");
        fill_contact(&mut session);
        let delivery = ScriptedDelivery::new(DeliveryOutcome::Rejected(
            json!({"errors": [{"message": "Invalid email"}, {"message": "Invalid phone"}]}),
        ));

        let result = session.submit(&delivery).await;

        assert_eq!(result, SubmissionResult::Failure("Invalid email".to_string()));
    }

    #[tokio::test]
    async fn transport_failure_without_body_uses_generic_text() {
        let mut session = session();
        walk_to_applying(&mut session, "conversation", "conversation-8");
        fill_contact(&mut session);
        let delivery = ScriptedDelivery::new(DeliveryOutcome::TransportFailure(None));
        let sink = InMemoryAuditSink::default();

        let result = session.submit_with_audit(&delivery, &sink, "req-7").await;

        assert_eq!(result, SubmissionResult::Failure(GENERIC_FAILURE_MESSAGE.to_string()));
        assert!(!session.is_in_flight());
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, AuditOutcome::Failed);
        assert_eq!(events[0].metadata.get("bundle_id").map(String::as_str), Some("conversation-8"));
    }

    #[test]
    fn outcome_landing_after_reset_is_discarded() {
        let mut session = session();
        walk_to_applying(&mut session, "main", "main-10");
        fill_contact(&mut session);
        let ticket = session.begin_submission().expect("selection is complete");
        assert!(session.is_in_flight());

        session.apply(WizardEvent::Reset).expect("reset while in flight");
        let disposition = session.complete_submission(ticket.sequence, DeliveryOutcome::Accepted);

        assert_eq!(disposition, CompletionDisposition::Stale);
        assert_eq!(session.submission_result(), &SubmissionResult::Idle);
        assert!(!session.is_in_flight());
    }

    #[test]
    fn begin_submission_without_bundle_is_a_noop() {
        let mut session = session();
        session.apply(WizardEvent::SelectCategory(CategoryId::from("main"))).expect("category");

        assert!(session.begin_submission().is_none());
        assert_eq!(session.submission_result(), &SubmissionResult::Idle);
    }

    #[test]
    fn audited_quote_records_currency_fallback() {
        let mut session = session();
        session.apply(WizardEvent::SelectCategory(CategoryId::from("main"))).expect("category");
        session
            .apply(WizardEvent::SelectBundle(BundleId::from("main-single")))
            .expect("bundle");
        session.set_currency(CurrencyCode::new("EUR"));
        let sink = InMemoryAuditSink::default();

        let quote = session.quote_with_audit(&sink, "req-9").expect("quote resolves");

        assert_eq!(quote.price.display_total, "$15");
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "pricing.quote_resolved");
        assert_eq!(events[0].metadata.get("requested_currency").map(String::as_str), Some("EUR"));
        assert_eq!(events[0].metadata.get("currency").map(String::as_str), Some("USD"));
    }

    #[test]
    fn audited_transitions_carry_session_id() {
        let mut session = session();
        let sink = InMemoryAuditSink::default();

        session
            .apply_with_audit(WizardEvent::SelectCategory(CategoryId::from("main")), &sink, "req-1")
            .expect("category");
        let _ = session.apply_with_audit(WizardEvent::Proceed, &sink, "req-2");

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].session_id.as_ref(), Some(session.id()));
        assert_eq!(events[1].event_type, "wizard.transition_rejected");
    }
}
