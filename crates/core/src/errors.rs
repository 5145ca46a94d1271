use thiserror::Error;

use crate::flows::WizardTransitionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    FlowTransition(#[from] WizardTransitionError),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("catalog failure: {0}")]
    Catalog(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<WizardTransitionError> for ApplicationError {
    fn from(value: WizardTransitionError) -> Self {
        Self::Domain(DomainError::from(value))
    }
}

impl ApplicationError {
    /// Stable machine-readable class for command output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "selection",
            Self::Catalog(_) => "catalog",
            Self::Integration(_) => "integration",
            Self::Configuration(_) => "config_validation",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) | Self::Catalog(_) => 2,
            Self::Domain(_) => 3,
            Self::Integration(_) => 4,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Domain(_) => {
                "That choice is not available at this step. Check the selection and try again."
            }
            Self::Catalog(_) | Self::Configuration(_) => {
                "The enrollment service is misconfigured."
            }
            Self::Integration(_) => {
                "The application could not be delivered. Please retry shortly."
            }
        }
    }
}
