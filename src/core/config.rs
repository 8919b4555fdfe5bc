use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::models::payment::{DiscountTable, PaymentChannel};

/// Quota units per currency unit when nothing else is configured.
pub const DEFAULT_QUOTA_PER_UNIT: Decimal = dec!(500000);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_format() -> String {
    "text".to_string()
}
fn default_color() -> String {
    "auto".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            color: default_color(),
        }
    }
}

/// Display settings every quota calculation is handed explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_quota_per_unit", with = "rust_decimal::serde::float")]
    pub quota_per_unit: Decimal,
    #[serde(default = "default_true")]
    pub display_in_currency: bool,
}

fn default_quota_per_unit() -> Decimal {
    DEFAULT_QUOTA_PER_UNIT
}
fn default_true() -> bool {
    true
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            quota_per_unit: DEFAULT_QUOTA_PER_UNIT,
            display_in_currency: true,
        }
    }
}

impl BillingConfig {
    pub fn new(quota_per_unit: Decimal, display_in_currency: bool) -> Self {
        Self {
            quota_per_unit,
            display_in_currency,
        }
    }

    /// Scale factor safe to divide by. Non-positive values fall back to the default.
    pub fn effective_quota_per_unit(&self) -> Decimal {
        if self.quota_per_unit > Decimal::ZERO {
            self.quota_per_unit
        } else {
            log::warn!(
                "quota_per_unit {} is not positive, using {}",
                self.quota_per_unit,
                DEFAULT_QUOTA_PER_UNIT
            );
            DEFAULT_QUOTA_PER_UNIT
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopupSettings {
    #[serde(default = "default_min_amount")]
    pub min_amount: u64,
    /// USD to CNY rate applied to CNY channels.
    #[serde(default = "default_usd_rate", with = "rust_decimal::serde::float")]
    pub usd_rate: Decimal,
    #[serde(default)]
    pub discounts: DiscountTable,
}

fn default_min_amount() -> u64 {
    1
}
fn default_usd_rate() -> Decimal {
    dec!(7.3)
}

impl Default for TopupSettings {
    fn default() -> Self {
        Self {
            min_amount: default_min_amount(),
            usd_rate: default_usd_rate(),
            discounts: DiscountTable::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub topup: TopupSettings,
    #[serde(default)]
    pub payments: Vec<PaymentChannel>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            billing: BillingConfig::default(),
            topup: TopupSettings::default(),
            payments: vec![
                PaymentChannel {
                    uuid: "stripe".into(),
                    name: "Stripe".into(),
                    icon: "stripe".into(),
                    currency: "USD".into(),
                    fixed_fee: Decimal::ZERO,
                    percent_fee: dec!(0.03),
                    sort: 10,
                },
                PaymentChannel {
                    uuid: "alipay".into(),
                    name: "Alipay".into(),
                    icon: "alipay".into(),
                    currency: "CNY".into(),
                    fixed_fee: Decimal::ZERO,
                    percent_fee: dec!(0.006),
                    sort: 5,
                },
            ],
        }
    }
}

impl AppConfig {
    /// Get the config file path, respecting XDG_CONFIG_HOME
    pub fn config_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("~"))
                    .join(".config")
            });
        config_dir.join("qv").join("config.toml")
    }

    /// Load config from the default path, falling back to defaults if not found
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        log::debug!("loading config from {}", path.display());
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize and write this config to the config file path.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.to_toml()?)?;
        Ok(path)
    }

    /// Render as the TOML written by `save`. Decimals become plain numbers.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Look up a channel by uuid or (case-insensitive) name.
    pub fn find_channel(&self, key: &str) -> Option<&PaymentChannel> {
        self.payments
            .iter()
            .find(|p| p.uuid == key)
            .or_else(|| self.payments.iter().find(|p| p.name.eq_ignore_ascii_case(key)))
    }

    /// Validate the config
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !["text", "json"].contains(&self.settings.default_format.as_str()) {
            issues.push(format!(
                "Invalid default_format: '{}' (must be 'text' or 'json')",
                self.settings.default_format
            ));
        }
        if !["auto", "always", "never"].contains(&self.settings.color.as_str()) {
            issues.push(format!(
                "Invalid color: '{}' (must be 'auto', 'always', or 'never')",
                self.settings.color
            ));
        }
        if self.billing.quota_per_unit <= Decimal::ZERO {
            issues.push(format!(
                "Invalid quota_per_unit: {} (must be positive)",
                self.billing.quota_per_unit
            ));
        }
        if self.topup.usd_rate <= Decimal::ZERO {
            issues.push(format!(
                "Invalid usd_rate: {} (must be positive)",
                self.topup.usd_rate
            ));
        }
        for (amount, multiplier) in self.topup.discounts.iter() {
            if !matches!(amount.parse::<u64>(), Ok(n) if n > 0) {
                issues.push(format!(
                    "Discount key '{}' is not a positive integer amount",
                    amount
                ));
            }
            if *multiplier <= Decimal::ZERO {
                issues.push(format!(
                    "Discount for '{}': multiplier {} must be positive",
                    amount, multiplier
                ));
            }
        }
        let mut seen = HashSet::new();
        for p in &self.payments {
            if !seen.insert(p.uuid.as_str()) {
                issues.push(format!("Duplicate payment channel uuid: '{}'", p.uuid));
            }
            if p.fixed_fee < Decimal::ZERO || p.percent_fee < Decimal::ZERO {
                issues.push(format!("Payment channel '{}': fees must not be negative", p.uuid));
            }
        }
        issues
    }
}
