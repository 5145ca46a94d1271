use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use enrollo_core::submission::{ApplicationPayload, Delivery, DeliveryOutcome};
use tracing::info;

/// In-memory collaborator that answers every delivery with a fixed outcome.
#[derive(Clone)]
pub struct RecordingDelivery {
    outcome: DeliveryOutcome,
    payloads: Arc<Mutex<Vec<ApplicationPayload>>>,
}

impl Default for RecordingDelivery {
    fn default() -> Self {
        Self::answering(DeliveryOutcome::Accepted)
    }
}

impl RecordingDelivery {
    pub fn answering(outcome: DeliveryOutcome) -> Self {
        Self { outcome, payloads: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn payloads(&self) -> Vec<ApplicationPayload> {
        match self.payloads.lock() {
            Ok(payloads) => payloads.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn deliver(&self, payload: &ApplicationPayload) -> DeliveryOutcome {
        let count = match self.payloads.lock() {
            Ok(mut payloads) => {
                payloads.push(payload.clone());
                payloads.len()
            }
            Err(poisoned) => {
                let mut payloads = poisoned.into_inner();
                payloads.push(payload.clone());
                payloads.len()
            }
        };
        info!(
            event_name = "intake.request.recorded",
            package_id = %payload.package_id,
            recorded = count,
            "application recorded without delivery"
        );
        self.outcome.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use enrollo_core::catalog::Catalog;
    use enrollo_core::domain::applicant::ApplicantField;
    use enrollo_core::domain::currency::CurrencyCode;
    use enrollo_core::domain::offering::{BundleId, CategoryId};
    use enrollo_core::flows::{WizardEvent, WizardSession};
    use enrollo_core::pricing::PricingResolver;
    use enrollo_core::submission::{DeliveryOutcome, SubmissionResult, SUCCESS_MESSAGE};

    use super::RecordingDelivery;

    #[tokio::test]
    async fn records_payload_from_a_full_wizard_run() {
        let mut session = WizardSession::new(
            Arc::new(Catalog::builtin()),
            PricingResolver::default(),
            CurrencyCode::new("KWD"),
        );
        session.apply(WizardEvent::SelectCategory(CategoryId::from("trial"))).expect("category");
        session
            .apply(WizardEvent::SelectBundle(BundleId::from("trial-lesson")))
            .expect("bundle");
        session.apply(WizardEvent::Proceed).expect("proceed");
        session.set_field(ApplicantField::FullName, "Omar Haddad");
        session.set_field(ApplicantField::Email, "omar@example.com");
        session.set_field(ApplicantField::Phone, "+965 6000 0000");
        session.set_field(ApplicantField::Country, "Kuwait");
        session.set_field(ApplicantField::PreferredDate, "2026-11-05");
        session.set_field(ApplicantField::PreferredTime, "17:30");
        assert!(session.is_ready_to_submit());
        let delivery = RecordingDelivery::default();

        let result = session.submit(&delivery).await;

        assert_eq!(result, SubmissionResult::Success(SUCCESS_MESSAGE.to_string()));
        let payloads = delivery.payloads();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].currency, "KWD");
        assert_eq!(payloads[0].display_total_price, "Free");
        assert_eq!(payloads[0].preferred_time, "17:30");
    }

    #[tokio::test]
    async fn scripted_outcome_is_returned() {
        let delivery = RecordingDelivery::answering(DeliveryOutcome::TransportFailure(None));
        let mut session = WizardSession::new(
            Arc::new(Catalog::builtin()),
            PricingResolver::default(),
            CurrencyCode::usd(),
        );
        session.apply(WizardEvent::SelectCategory(CategoryId::from("main"))).expect("category");
        session.apply(WizardEvent::SelectBundle(BundleId::from("main-20"))).expect("bundle");

        let result = session.submit(&delivery).await;

        assert!(matches!(result, SubmissionResult::Failure(_)));
        assert_eq!(delivery.payloads().len(), 1);
    }
}
