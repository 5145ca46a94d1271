use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::offering::CategoryId;
use crate::flows::states::{FlowAction, FlowContext, TransitionOutcome, WizardEvent, WizardStep};
use crate::selection::SelectionError;

pub trait FlowDefinition {
    fn initial_step(&self) -> WizardStep;
    fn transition(
        &self,
        current: WizardStep,
        event: &WizardEvent,
        context: &FlowContext<'_>,
    ) -> Result<TransitionOutcome, WizardTransitionError>;
}

/// Category, then bundle, then details, then the application form.
#[derive(Clone, Debug, Default)]
pub struct EnrollmentFlow;

impl FlowDefinition for EnrollmentFlow {
    fn initial_step(&self) -> WizardStep {
        WizardStep::ChoosingCategory
    }

    fn transition(
        &self,
        current: WizardStep,
        event: &WizardEvent,
        context: &FlowContext<'_>,
    ) -> Result<TransitionOutcome, WizardTransitionError> {
        transition_enrollment(current, event, context)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequiredSelection {
    Category,
    Bundle,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardTransitionError {
    #[error("invalid transition from {step:?} using event {event:?}")]
    InvalidTransition { step: WizardStep, event: WizardEvent },
    #[error("{step:?} requires a resolved {missing:?} selection")]
    MissingSelection { step: WizardStep, missing: RequiredSelection },
    #[error("category `{category_id}` is not in the catalog")]
    UnknownCategory { category_id: CategoryId },
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_step(&self) -> WizardStep {
        self.flow.initial_step()
    }

    pub fn apply(
        &self,
        current: WizardStep,
        event: &WizardEvent,
        context: &FlowContext<'_>,
    ) -> Result<TransitionOutcome, WizardTransitionError> {
        self.flow.transition(current, event, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: WizardStep,
        event: &WizardEvent,
        context: &FlowContext<'_>,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, WizardTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "wizard.transition_applied",
                        AuditCategory::Wizard,
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", outcome.from.as_str())
                    .with_metadata("to", outcome.to.as_str())
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "wizard.transition_rejected",
                        AuditCategory::Wizard,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("from", current.as_str())
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<EnrollmentFlow> {
    fn default() -> Self {
        Self::new(EnrollmentFlow)
    }
}

fn transition_enrollment(
    current: WizardStep,
    event: &WizardEvent,
    context: &FlowContext<'_>,
) -> Result<TransitionOutcome, WizardTransitionError> {
    use FlowAction::{ClearBundle, ClearSession, RecordBundle, RecordCategory};
    use WizardEvent::{Back, Proceed, Reset, SelectBundle, SelectCategory};
    use WizardStep::{Applying, ChoosingBundle, ChoosingCategory, ReviewingDetails};

    let require = |missing: RequiredSelection| -> Result<(), WizardTransitionError> {
        let resolved = match missing {
            RequiredSelection::Category => context.category_resolved(),
            RequiredSelection::Bundle => context.bundle_resolved(),
        };
        if resolved {
            Ok(())
        } else {
            Err(WizardTransitionError::MissingSelection { step: current, missing })
        }
    };

    let (to, actions) = match (current, event) {
        (_, Reset) => (ChoosingCategory, vec![ClearSession]),
        (ChoosingCategory, SelectCategory(category_id)) => {
            if context.catalog.find_category(category_id).is_none() {
                return Err(WizardTransitionError::UnknownCategory {
                    category_id: category_id.clone(),
                });
            }
            (ChoosingBundle, vec![RecordCategory(category_id.clone())])
        }
        (ChoosingBundle, Back) => (ChoosingCategory, vec![ClearBundle]),
        (ChoosingBundle, SelectBundle(bundle_id)) => {
            require(RequiredSelection::Category)?;
            let category_id = context
                .selection
                .category_id
                .as_ref()
                .ok_or(WizardTransitionError::MissingSelection {
                    step: current,
                    missing: RequiredSelection::Category,
                })?;
            if context.catalog.find_bundle(category_id, bundle_id).is_none() {
                return Err(SelectionError::BundleNotInCategory {
                    category_id: category_id.clone(),
                    bundle_id: bundle_id.clone(),
                }
                .into());
            }
            (ReviewingDetails, vec![RecordBundle(bundle_id.clone())])
        }
        (ReviewingDetails, Back) => {
            require(RequiredSelection::Category)?;
            (ChoosingBundle, Vec::new())
        }
        (ReviewingDetails, Proceed) => {
            require(RequiredSelection::Bundle)?;
            (Applying, Vec::new())
        }
        (Applying, Back) => {
            require(RequiredSelection::Bundle)?;
            (ReviewingDetails, Vec::new())
        }
        _ => {
            return Err(WizardTransitionError::InvalidTransition {
                step: current,
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: current, to, event: event.clone(), actions })
}
