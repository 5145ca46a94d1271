use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::currency::CurrencyCode;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleId(pub String);

impl CategoryId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl BundleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<&str> for BundleId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub id: CategoryId,
    pub title: String,
    pub subtitle: String,
    pub description: String,
}

/// A priced package of lessons. Ownership by a category is recorded by the
/// catalog index, not on the bundle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleDefinition {
    pub id: BundleId,
    pub title: String,
    pub unit_count: u32,
    pub price_by_currency: BTreeMap<CurrencyCode, Decimal>,
    #[serde(default)]
    pub per_unit_label_by_currency: BTreeMap<CurrencyCode, String>,
}

impl BundleDefinition {
    pub fn price_for(&self, currency: &CurrencyCode) -> Option<Decimal> {
        self.price_by_currency.get(currency).copied()
    }

    pub fn per_unit_label_for(&self, currency: &CurrencyCode) -> Option<&str> {
        self.per_unit_label_by_currency.get(currency).map(String::as_str)
    }
}
