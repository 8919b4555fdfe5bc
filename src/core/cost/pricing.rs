use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::config::BillingConfig;
use crate::core::cost::units::{checked_product, to_fixed};
use crate::core::formatter::{render_quota, trim_trailing_zeros};
use crate::core::models::breakdown::{CostExplanation, PriceBreakdown, PriceType, TokenBreakdown};
use crate::core::models::log::LogEntry;

/// USD per ratio unit per 1K tokens (or per call for "times" pricing).
const USD_BASE_PRICE: Decimal = dec!(0.002);
/// CNY counterpart of [`USD_BASE_PRICE`] used by the model price list.
const CNY_BASE_PRICE: Decimal = dec!(0.014);
const PER_MILLION: Decimal = dec!(1000);
/// Shown in place of a price whose product does not fit in a `Decimal`.
pub const UNAVAILABLE_PRICE: &str = "N/A";

/// Price for a ratio after the group discount, six decimals, trailing zeros trimmed.
/// Token prices are quoted per million tokens.
pub fn calculate_price(ratio: Decimal, group_discount: Decimal, is_times: bool) -> String {
    let unit = if is_times { Decimal::ONE } else { PER_MILLION };
    match checked_product(&[ratio, group_discount, unit, USD_BASE_PRICE]) {
        Some(price) => trim_trailing_zeros(&to_fixed(price, 6)),
        None => {
            log::warn!("price for ratio {} x {} overflowed", ratio, group_discount);
            UNAVAILABLE_PRICE.to_string()
        }
    }
}

/// Returns "0.80x" for a pair of multipliers.
pub fn discount_label(value1: Decimal, value2: Decimal) -> String {
    match value1.checked_mul(value2) {
        Some(v) => format!("{}x", to_fixed(v, 2)),
        None => UNAVAILABLE_PRICE.to_string(),
    }
}

/// Reconstruct the prices and calculation behind a log entry's charge.
///
/// Entries without an input ratio predate ratio billing and fall back to the
/// backend's content string.
pub fn explain_cost(
    entry: &LogEntry,
    tokens: &TokenBreakdown,
    billing: &BillingConfig,
) -> CostExplanation {
    let metadata = entry.metadata.as_ref();
    let input_ratio = match metadata.and_then(|m| m.input_ratio).filter(|r| !r.is_zero()) {
        Some(r) => r,
        None => {
            return CostExplanation::Flat {
                content: entry.content.clone(),
                free: entry.quota == 0 && entry.is_consume(),
                illustrate: entry.quota != 0,
            }
        }
    };
    let metadata = metadata.cloned().unwrap_or_default();
    let group_discount = metadata.group_discount();
    let discount_label = if group_discount > Decimal::ZERO && group_discount != Decimal::ONE {
        Some(discount_label(group_discount, Decimal::ONE))
    } else {
        None
    };

    if metadata.is_times_priced() {
        return CostExplanation::Priced(PriceBreakdown {
            price_type: PriceType::Times,
            group_discount,
            input_price: calculate_price(input_ratio, group_discount, true),
            output_price: None,
            original_input_price: calculate_price(input_ratio, Decimal::ONE, true),
            original_output_price: None,
            discount_label,
            calculate_steps: None,
        });
    }

    let output_ratio = metadata.output_ratio.unwrap_or(Decimal::ZERO);
    let input_price = calculate_price(input_ratio, group_discount, false);
    let output_price = calculate_price(output_ratio, group_discount, false);

    let mut steps = format!(
        "Calculation: ({} / 1000000 * {})",
        tokens.total_input_tokens, input_price
    );
    if tokens.total_output_tokens > 0 {
        steps.push_str(&format!(
            " + ({} / 1000000 * {})",
            tokens.total_output_tokens, output_price
        ));
    }
    steps.push_str(&format!(" = {}", render_quota(entry.quota, 6, billing)));

    CostExplanation::Priced(PriceBreakdown {
        price_type: PriceType::Tokens,
        group_discount,
        input_price,
        output_price: Some(output_price),
        original_input_price: calculate_price(input_ratio, Decimal::ONE, false),
        original_output_price: Some(calculate_price(output_ratio, Decimal::ONE, false)),
        discount_label,
        calculate_steps: Some(steps),
    })
}

/// Model price list cell: "$0.002 / ¥0.014", "$0.002" when USD only, "Free" for zero.
/// Empty when the ratio is missing or too large to price.
pub fn value_formatter(value: Option<Decimal>, only_usd: bool, unit_million: bool) -> String {
    let Some(value) = value else {
        return String::new();
    };
    if value.is_zero() {
        return "Free".to_string();
    }
    let unit = if unit_million { PER_MILLION } else { Decimal::ONE };

    let (Some(usd), Some(cny)) = (
        checked_product(&[value, unit, USD_BASE_PRICE]),
        checked_product(&[value, unit, CNY_BASE_PRICE]),
    ) else {
        log::warn!("list price for ratio {} overflowed", value);
        return String::new();
    };
    if only_usd {
        return format!("${}", significant(usd));
    }
    format!("${} / ¥{}", significant(usd), significant(cny))
}

fn significant(value: Decimal) -> String {
    let rounded = value.round_sf(6).unwrap_or(value);
    trim_trailing_zeros(&rounded.to_string())
}
