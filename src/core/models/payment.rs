use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A payment method offered by the backend for top-ups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentChannel {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Flat fee; when positive it replaces the percentage fee.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub fixed_fee: Decimal,
    /// Fractional fee rate, e.g. `0.03` for 3%.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub percent_fee: Decimal,
    #[serde(default)]
    pub sort: i64,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl PaymentChannel {
    pub fn is_cny(&self) -> bool {
        self.currency.eq_ignore_ascii_case("CNY")
    }

    pub fn has_fixed_fee(&self) -> bool {
        self.fixed_fee > Decimal::ZERO
    }

    /// "Alipay (CNY)" style label used by the picker and renderer.
    pub fn display_name(&self) -> String {
        let name = if self.name.is_empty() { &self.uuid } else { &self.name };
        format!("{} ({})", name, self.currency.to_uppercase())
    }
}

/// Top-up discount multipliers keyed by the literal amount, e.g. `{"10": 0.9}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct DiscountTable(BTreeMap<String, Decimal>);

impl DiscountTable {
    /// Parse the backend's JSON string form. An empty string means no discounts.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw)
    }

    /// Multiplier for an amount; missing or zero entries mean no discount.
    pub fn multiplier(&self, amount: u64) -> Decimal {
        self.0
            .get(&amount.to_string())
            .copied()
            .filter(|m| !m.is_zero())
            .unwrap_or(Decimal::ONE)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Decimal)> {
        self.0.iter()
    }
}

/// Multipliers are written as numbers so the config file stays hand-editable.
impl Serialize for DiscountTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (amount, multiplier) in &self.0 {
            map.serialize_entry(amount, &Multiplier(multiplier))?;
        }
        map.end()
    }
}

struct Multiplier<'a>(&'a Decimal);

impl Serialize for Multiplier<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(self.0, serializer)
    }
}
