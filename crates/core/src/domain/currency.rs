use std::fmt;

use serde::{Deserialize, Serialize};

/// Currency every price lookup falls back to.
pub const BASE_CURRENCY: &str = "USD";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_uppercase())
    }

    pub fn usd() -> Self {
        Self(BASE_CURRENCY.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_base(&self) -> bool {
        self.0 == BASE_CURRENCY
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::usd()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Display metadata for one currency. `symbol_prefixed` decides between
/// `$15` and `15 KWD` renderings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    pub code: CurrencyCode,
    pub symbol: String,
    pub symbol_prefixed: bool,
}

impl CurrencyInfo {
    pub fn prefixed(code: &str, symbol: &str) -> Self {
        Self { code: CurrencyCode::new(code), symbol: symbol.to_owned(), symbol_prefixed: true }
    }

    pub fn suffixed(code: &str) -> Self {
        Self { code: CurrencyCode::new(code), symbol: code.to_owned(), symbol_prefixed: false }
    }

    /// Renders an already-formatted numeric value in this currency's style.
    pub fn render(&self, value: &str) -> String {
        if self.symbol_prefixed {
            format!("{}{value}", self.symbol)
        } else {
            format!("{value} {}", self.code)
        }
    }
}

/// Supported currencies. The base currency is always present so any
/// unrecognized code can degrade to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrencyTable {
    base: CurrencyInfo,
    others: Vec<CurrencyInfo>,
}

impl CurrencyTable {
    pub fn new(currencies: Vec<CurrencyInfo>) -> Self {
        let mut base = CurrencyInfo::prefixed(BASE_CURRENCY, "$");
        let mut others = Vec::with_capacity(currencies.len());
        for info in currencies {
            if info.code.is_base() {
                base = info;
            } else if !others.iter().any(|known: &CurrencyInfo| known.code == info.code) {
                others.push(info);
            }
        }
        Self { base, others }
    }

    pub fn base(&self) -> &CurrencyInfo {
        &self.base
    }

    pub fn find(&self, code: &CurrencyCode) -> Option<&CurrencyInfo> {
        if &self.base.code == code {
            return Some(&self.base);
        }
        self.others.iter().find(|info| &info.code == code)
    }

    pub fn is_supported(&self, code: &CurrencyCode) -> bool {
        self.find(code).is_some()
    }

    /// Looks up `code`, degrading to the base currency when it is unknown.
    pub fn resolve(&self, code: &CurrencyCode) -> &CurrencyInfo {
        self.find(code).unwrap_or(&self.base)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurrencyInfo> {
        std::iter::once(&self.base).chain(self.others.iter())
    }
}

impl Default for CurrencyTable {
    fn default() -> Self {
        Self::new(vec![CurrencyInfo::prefixed("USD", "$"), CurrencyInfo::suffixed("KWD")])
    }
}
