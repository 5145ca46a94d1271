use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::domain::offering::{BundleId, CategoryId};
use crate::selection::Selection;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    #[default]
    ChoosingCategory,
    ChoosingBundle,
    ReviewingDetails,
    Applying,
}

impl WizardStep {
    /// Short name used by the screens (`type`, `packages`, `details`, `apply`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChoosingCategory => "type",
            Self::ChoosingBundle => "packages",
            Self::ReviewingDetails => "details",
            Self::Applying => "apply",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardEvent {
    SelectCategory(CategoryId),
    SelectBundle(BundleId),
    Back,
    Proceed,
    Reset,
}

/// Read-only view the transition guards consult.
#[derive(Clone, Copy, Debug)]
pub struct FlowContext<'a> {
    pub catalog: &'a Catalog,
    pub selection: &'a Selection,
}

impl<'a> FlowContext<'a> {
    pub fn new(catalog: &'a Catalog, selection: &'a Selection) -> Self {
        Self { catalog, selection }
    }

    pub fn category_resolved(&self) -> bool {
        self.selection
            .category_id
            .as_ref()
            .map(|id| self.catalog.find_category(id).is_some())
            .unwrap_or(false)
    }

    pub fn bundle_resolved(&self) -> bool {
        match (&self.selection.category_id, &self.selection.bundle_id) {
            (Some(category_id), Some(bundle_id)) => {
                self.catalog.find_bundle(category_id, bundle_id).is_some()
            }
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    RecordCategory(CategoryId),
    RecordBundle(BundleId),
    ClearBundle,
    ClearSession,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: WizardStep,
    pub to: WizardStep,
    pub event: WizardEvent,
    pub actions: Vec<FlowAction>,
}
