pub mod engine;
pub mod session;
pub mod states;

pub use engine::{
    EnrollmentFlow, FlowDefinition, FlowEngine, RequiredSelection, WizardTransitionError,
};
pub use session::{QuoteView, SessionId, WizardSession};
pub use states::{FlowAction, FlowContext, TransitionOutcome, WizardEvent, WizardStep};
