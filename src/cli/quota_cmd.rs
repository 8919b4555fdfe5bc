use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::core::config::BillingConfig;
use crate::core::cost::pricing::value_formatter;
use crate::core::cost::units::{amount_to_quota, quota_to_amount};
use crate::core::formatter::{render_number, render_quota, render_quota_with_prompt};

#[derive(Serialize)]
struct QuotaPayload {
    quota: i64,
    amount: String,
    display: String,
    abbreviated: String,
}

#[derive(Serialize)]
struct AmountPayload {
    amount: Decimal,
    quota: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    hint: String,
}

#[derive(Serialize)]
struct PricePayload {
    ratio: Decimal,
    price: String,
}

/// `qv quota <QUOTA>`: quota -> currency amount and display string.
pub fn quota(value: i64, digits: u32, billing: &BillingConfig, opts: &OutputOptions) -> Result<()> {
    let payload = QuotaPayload {
        quota: value,
        amount: quota_to_amount(value, digits, billing),
        display: render_quota(value, digits, billing),
        abbreviated: render_number(value),
    };
    match opts.format {
        OutputFormat::Text => {
            println!("{}", payload.display);
            if opts.verbose {
                eprintln!(
                    "{} quota = {} at {} quota per unit",
                    payload.quota,
                    payload.amount,
                    billing.effective_quota_per_unit()
                );
            }
        }
        OutputFormat::Json => println!("{}", opts.to_json(&payload)?),
    }
    Ok(())
}

/// `qv amount <AMOUNT>`: currency amount -> quota.
pub fn amount(raw: &str, billing: &BillingConfig, opts: &OutputOptions) -> Result<()> {
    let amount = parse_decimal(raw).with_context(|| format!("Invalid amount: '{}'", raw))?;
    let payload = AmountPayload {
        amount,
        quota: amount_to_quota(amount, billing),
        hint: render_quota_with_prompt(amount, billing),
    };
    match opts.format {
        OutputFormat::Text => {
            if payload.hint.is_empty() {
                println!("{}", payload.quota);
            } else {
                println!("{} {}", payload.quota, payload.hint);
            }
        }
        OutputFormat::Json => println!("{}", opts.to_json(&payload)?),
    }
    Ok(())
}

/// `qv price <RATIO>`: model ratio -> list price.
pub fn price(raw: &str, usd_only: bool, per_million: bool, opts: &OutputOptions) -> Result<()> {
    let ratio = parse_decimal(raw).with_context(|| format!("Invalid ratio: '{}'", raw))?;
    let payload = PricePayload {
        ratio,
        price: value_formatter(Some(ratio), usd_only, per_million),
    };
    match opts.format {
        OutputFormat::Text => println!("{}", payload.price),
        OutputFormat::Json => println!("{}", opts.to_json(&payload)?),
    }
    Ok(())
}

fn parse_decimal(raw: &str) -> Result<Decimal, rust_decimal::Error> {
    let raw = raw.trim();
    Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_decimal_accepts_plain_and_scientific() {
        assert_eq!(parse_decimal(" 1.25 ").unwrap(), dec!(1.25));
        assert_eq!(parse_decimal("1e-3").unwrap(), dec!(0.001));
        assert!(parse_decimal("ten").is_err());
    }

    #[test]
    fn amount_payload_omits_empty_hint() {
        let payload = AmountPayload {
            amount: dec!(1),
            quota: 500_000,
            hint: String::new(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("hint"));
    }
}
