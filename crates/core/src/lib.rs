pub mod audit;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod pricing;
pub mod selection;
pub mod submission;
pub mod validation;

pub use catalog::{Catalog, CatalogError};
pub use domain::applicant::{ApplicantField, ApplicantFields};
pub use domain::currency::{CurrencyCode, CurrencyInfo, CurrencyTable};
pub use domain::offering::{BundleDefinition, BundleId, CategoryDefinition, CategoryId};
pub use errors::{ApplicationError, DomainError};
pub use flows::{QuoteView, SessionId, WizardEvent, WizardSession, WizardStep};
pub use pricing::{PricingResolver, ResolvedPrice};
pub use selection::{Selection, SelectionError, SelectionState};
pub use submission::{
    ApplicationPayload, Delivery, DeliveryOutcome, SubmissionController, SubmissionResult,
};
