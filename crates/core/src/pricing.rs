use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::currency::{CurrencyCode, CurrencyInfo, CurrencyTable};
use crate::domain::offering::BundleDefinition;

pub const FREE_LABEL: &str = "Free";
pub const PER_UNIT_SUFFIX: &str = "per lesson";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPrice {
    /// Currency the display strings are rendered in.
    pub currency: CurrencyCode,
    pub total: Decimal,
    pub display_total: String,
    pub display_per_unit: String,
}

impl ResolvedPrice {
    pub fn is_free(&self) -> bool {
        self.total.is_zero()
    }
}

/// Requested currency, then the base currency, then zero. Never fails.
pub fn resolve_total(bundle: &BundleDefinition, currency: &CurrencyCode) -> Decimal {
    bundle
        .price_for(currency)
        .or_else(|| bundle.price_for(&CurrencyCode::usd()))
        .unwrap_or(Decimal::ZERO)
}

/// Amount divided across the bundle's lessons, rounded half away from zero
/// to two decimal places.
pub fn per_unit_amount(bundle: &BundleDefinition, currency: &CurrencyCode) -> Decimal {
    let amount = resolve_total(bundle, currency);
    let per_unit =
        if bundle.unit_count == 0 { amount } else { amount / Decimal::from(bundle.unit_count) };
    per_unit.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn format_total(amount: Decimal, info: &CurrencyInfo) -> String {
    if amount.is_zero() {
        return FREE_LABEL.to_string();
    }
    info.render(&amount.normalize().to_string())
}

fn format_per_unit(amount: Decimal, info: &CurrencyInfo) -> String {
    if amount.is_zero() {
        return FREE_LABEL.to_string();
    }
    let mut fixed = amount;
    fixed.rescale(2);
    format!("{} {PER_UNIT_SUFFIX}", info.render(&fixed.to_string()))
}

/// Turns catalog prices into the strings shown to applicants.
#[derive(Clone, Debug, Default)]
pub struct PricingResolver {
    currencies: CurrencyTable,
}

impl PricingResolver {
    pub fn new(currencies: CurrencyTable) -> Self {
        Self { currencies }
    }

    /// Currency used for rendering; unknown codes read as the base currency.
    pub fn display_currency(&self, currency: &CurrencyCode) -> &CurrencyInfo {
        self.currencies.resolve(currency)
    }

    /// Whether the table carries `currency` rather than degrading it.
    pub fn is_supported(&self, currency: &CurrencyCode) -> bool {
        self.currencies.is_supported(currency)
    }

    pub fn resolve_total(&self, bundle: &BundleDefinition, currency: &CurrencyCode) -> Decimal {
        resolve_total(bundle, &self.display_currency(currency).code)
    }

    pub fn display_total(&self, bundle: &BundleDefinition, currency: &CurrencyCode) -> String {
        let info = self.display_currency(currency);
        format_total(resolve_total(bundle, &info.code), info)
    }

    /// Catalog-provided copy wins verbatim; otherwise the label is derived
    /// from the resolved total.
    pub fn resolve_per_unit_label(
        &self,
        bundle: &BundleDefinition,
        currency: &CurrencyCode,
    ) -> String {
        let info = self.display_currency(currency);
        if let Some(label) = bundle.per_unit_label_for(&info.code) {
            return label.to_string();
        }
        format_per_unit(per_unit_amount(bundle, &info.code), info)
    }

    /// Prices and labels are looked up under the rendering currency, so an
    /// unsupported request reads exactly like the base currency.
    pub fn resolve(&self, bundle: &BundleDefinition, currency: &CurrencyCode) -> ResolvedPrice {
        let info = self.display_currency(currency);
        let total = resolve_total(bundle, &info.code);
        ResolvedPrice {
            currency: info.code.clone(),
            total,
            display_total: format_total(total, info),
            display_per_unit: self.resolve_per_unit_label(bundle, &info.code),
        }
    }
}
