use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::catalog::Catalog;
use crate::domain::currency::CurrencyCode;
use crate::domain::offering::{BundleDefinition, BundleId, CategoryDefinition, CategoryId};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub category_id: Option<CategoryId>,
    pub bundle_id: Option<BundleId>,
    pub currency: CurrencyCode,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("bundle `{bundle_id}` cannot be selected before a category")]
    NoCategorySelected { bundle_id: BundleId },
    #[error("bundle `{bundle_id}` is not offered under category `{category_id}`")]
    BundleNotInCategory { category_id: CategoryId, bundle_id: BundleId },
}

/// Current category, bundle and currency choice for one session, with
/// lookups resolved against the catalog.
#[derive(Clone, Debug)]
pub struct SelectionState {
    catalog: Arc<Catalog>,
    default_currency: CurrencyCode,
    selection: Selection,
}

impl SelectionState {
    pub fn new(catalog: Arc<Catalog>, default_currency: CurrencyCode) -> Self {
        let selection = Selection { currency: default_currency.clone(), ..Selection::default() };
        Self { catalog, default_currency, selection }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.selection.currency
    }

    /// Any previously chosen bundle is dropped, even when the new category
    /// offers a bundle with the same id.
    pub fn select_category(&mut self, category_id: CategoryId) {
        self.selection.category_id = Some(category_id);
        self.selection.bundle_id = None;
    }

    /// Leaves the selection untouched unless the bundle belongs to the
    /// current category.
    pub fn select_bundle(&mut self, bundle_id: BundleId) -> Result<(), SelectionError> {
        let Some(category_id) = self.selection.category_id.as_ref() else {
            warn!(
                event_name = "wizard.selection.rejected",
                bundle_id = %bundle_id,
                reason = "no_category",
                "bundle selection ignored"
            );
            return Err(SelectionError::NoCategorySelected { bundle_id });
        };

        if self.catalog.find_bundle(category_id, &bundle_id).is_none() {
            warn!(
                event_name = "wizard.selection.rejected",
                category_id = %category_id,
                bundle_id = %bundle_id,
                reason = "not_in_category",
                "bundle selection ignored"
            );
            return Err(SelectionError::BundleNotInCategory {
                category_id: category_id.clone(),
                bundle_id,
            });
        }

        self.selection.bundle_id = Some(bundle_id);
        Ok(())
    }

    pub fn clear_bundle(&mut self) {
        self.selection.bundle_id = None;
    }

    /// Stored as given; unsupported codes are handled by price fallback.
    pub fn set_currency(&mut self, currency: CurrencyCode) {
        self.selection.currency = currency;
    }

    pub fn current_category(&self) -> Option<&CategoryDefinition> {
        self.selection.category_id.as_ref().and_then(|id| self.catalog.find_category(id))
    }

    pub fn current_bundle(&self) -> Option<&BundleDefinition> {
        let category_id = self.selection.category_id.as_ref()?;
        let bundle_id = self.selection.bundle_id.as_ref()?;
        self.catalog.find_bundle(category_id, bundle_id)
    }

    pub fn reset(&mut self) {
        self.selection =
            Selection { currency: self.default_currency.clone(), ..Selection::default() };
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{SelectionError, SelectionState};
    use crate::catalog::Catalog;
    use crate::domain::currency::CurrencyCode;
    use crate::domain::offering::{BundleId, CategoryId};

    fn state() -> SelectionState {
        SelectionState::new(Arc::new(Catalog::builtin()), CurrencyCode::usd())
    }

    #[test]
    fn selecting_a_category_clears_the_bundle() {
        let mut state = state();
        state.select_category(CategoryId::from("main"));
        state.select_bundle(BundleId::from("main-10")).expect("bundle belongs to main");
        assert!(state.current_bundle().is_some());

        state.select_category(CategoryId::from("conversation"));

        assert_eq!(state.selection().bundle_id, None);
        assert!(state.current_bundle().is_none());
    }

    #[test]
    fn reselecting_the_same_category_still_clears_the_bundle() {
        let mut state = state();
        state.select_category(CategoryId::from("main"));
        state.select_bundle(BundleId::from("main-single")).expect("bundle belongs to main");

        state.select_category(CategoryId::from("main"));

        assert_eq!(state.selection().bundle_id, None);
    }

    #[test]
    fn bundle_requires_a_category() {
        let mut state = state();
        let error =
            state.select_bundle(BundleId::from("main-10")).expect_err("no category selected");

        assert!(matches!(error, SelectionError::NoCategorySelected { .. }));
        assert_eq!(state.selection().bundle_id, None);
    }

    #[test]
    fn bundle_from_another_category_is_ignored() {
        let mut state = state();
        state.select_category(CategoryId::from("trial"));
        state.select_bundle(BundleId::from("trial-lesson")).expect("trial bundle");

        let error =
            state.select_bundle(BundleId::from("main-10")).expect_err("wrong category bundle");

        assert!(matches!(error, SelectionError::BundleNotInCategory { .. }));
        assert_eq!(state.selection().bundle_id, Some(BundleId::from("trial-lesson")));
    }

    #[test]
    fn unresolvable_category_reads_as_none() {
        let mut state = state();
        state.select_category(CategoryId::from("retired"));

        assert!(state.current_category().is_none());
        assert!(state.current_bundle().is_none());
    }

    #[test]
    fn currency_is_stored_without_validation() {
        let mut state = state();
        state.set_currency(CurrencyCode::new("EUR"));

        assert_eq!(state.currency().as_str(), "EUR");
    }

    #[test]
    fn reset_restores_default_currency_and_clears_ids() {
        let mut state = SelectionState::new(Arc::new(Catalog::builtin()), CurrencyCode::new("KWD"));
        state.set_currency(CurrencyCode::usd());
        state.select_category(CategoryId::from("main"));
        state.select_bundle(BundleId::from("main-20")).expect("bundle belongs to main");

        state.reset();

        assert_eq!(state.selection().category_id, None);
        assert_eq!(state.selection().bundle_id, None);
        assert_eq!(state.currency().as_str(), "KWD");
    }
}
