use chrono::{Local, TimeZone};
use rust_decimal::Decimal;

use crate::core::config::BillingConfig;
use crate::core::cost::units::{amount_to_quota, quota_to_amount, to_fixed};

/// Returns "$1.23" / "-$1.23" when currency display is on, otherwise the
/// abbreviated quota from [`render_number`].
pub fn render_quota(quota: i64, digits: u32, billing: &BillingConfig) -> String {
    if !billing.display_in_currency {
        return render_number(quota);
    }
    if quota < 0 {
        format!("-${}", quota_to_amount(quota.saturating_abs(), digits, billing))
    } else {
        format!("${}", quota_to_amount(quota, digits, billing))
    }
}

/// Abbreviates with B/M/k suffixes and one decimal. Display only.
pub fn render_number(num: i64) -> String {
    let value = Decimal::from(num);
    if num >= 1_000_000_000 {
        format!("{}B", to_fixed(value / Decimal::from(1_000_000_000), 1))
    } else if num >= 1_000_000 {
        format!("{}M", to_fixed(value / Decimal::from(1_000_000), 1))
    } else if num >= 10_000 {
        format!("{}k", to_fixed(value / Decimal::from(1_000), 1))
    } else {
        num.to_string()
    }
}

/// "(equivalent quota: 5.0M)" hint shown next to a currency amount input.
/// Empty when quota is displayed raw.
pub fn render_quota_with_prompt(amount: Decimal, billing: &BillingConfig) -> String {
    if !billing.display_in_currency {
        return String::new();
    }
    let quota = amount_to_quota(amount, billing);
    format!("(equivalent quota: {})", render_number(quota))
}

/// Returns "1,234,567".
pub fn thousands_separator(num: i64) -> String {
    let digits = num.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if num < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Drop trailing fractional zeros: "0.003200" -> "0.0032", "2.000" -> "2".
pub fn trim_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Unix seconds as local "YYYY-MM-DD HH:MM:SS".
pub fn format_timestamp(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}
