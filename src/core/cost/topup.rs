use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::core::cost::units::{checked_product, to_fixed};
use crate::core::models::breakdown::TopupQuote;
use crate::core::models::payment::{DiscountTable, PaymentChannel};

/// Largest amount a single top-up may request.
pub const MAX_TOPUP_AMOUNT: u64 = 1_000_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopupError {
    #[error("Please select a payment method")]
    NoChannel,
    #[error("Amount must not be less than {0}")]
    BelowMinimum(u64),
    #[error("Amount must not be greater than {0}")]
    AboveMaximum(u64),
    #[error("Amount must be a positive integer")]
    NotPositiveInteger,
}

/// Check a raw amount input before any total is computed.
pub fn validate_topup(
    input: &str,
    min_amount: u64,
    channel: Option<&PaymentChannel>,
) -> Result<u64, TopupError> {
    if channel.is_none() {
        return Err(TopupError::NoChannel);
    }
    let amount = match Decimal::from_str(input.trim()) {
        Ok(a) => a,
        Err(_) => return Err(TopupError::NotPositiveInteger),
    };
    if amount <= Decimal::ZERO || amount < Decimal::from(min_amount) {
        return Err(TopupError::BelowMinimum(min_amount));
    }
    if amount > Decimal::from(MAX_TOPUP_AMOUNT) {
        return Err(TopupError::AboveMaximum(MAX_TOPUP_AMOUNT));
    }
    if !amount.fract().is_zero() {
        return Err(TopupError::NotPositiveInteger);
    }
    amount.to_u64().ok_or(TopupError::NotPositiveInteger)
}

/// Fee charged by the channel. A fixed fee ignores discounts; a percentage
/// fee applies to the discounted amount and is rounded to cents. Zero if the
/// product overflows.
pub fn compute_fee(amount: u64, channel: &PaymentChannel, discounts: &DiscountTable) -> Decimal {
    if channel.has_fixed_fee() {
        return channel.fixed_fee;
    }
    let factors = [
        Decimal::from(amount),
        discounts.multiplier(amount),
        channel.percent_fee,
    ];
    match checked_product(&factors) {
        Some(fee) => round_cents(fee),
        None => {
            log::warn!("fee for amount {} via {} overflowed", amount, channel.uuid);
            Decimal::ZERO
        }
    }
}

/// Payable total in the channel's currency. The discount touches only the base
/// amount; CNY channels convert the sum at `usd_rate`. Zero if any step overflows.
pub fn compute_total(
    amount: u64,
    channel: &PaymentChannel,
    discounts: &DiscountTable,
    usd_rate: Decimal,
) -> Decimal {
    if amount == 0 {
        return Decimal::ZERO;
    }
    let rate = if channel.is_cny() { usd_rate } else { Decimal::ONE };
    let total = Decimal::from(amount)
        .checked_mul(discounts.multiplier(amount))
        .and_then(|discounted| discounted.checked_add(compute_fee(amount, channel, discounts)))
        .and_then(|sum| sum.checked_mul(rate));
    match total {
        Some(total) if channel.is_cny() => round_cents(total),
        Some(total) => total,
        None => {
            log::warn!("total for amount {} via {} overflowed", amount, channel.uuid);
            Decimal::ZERO
        }
    }
}

/// Returns "¥7.30/ $" for CNY channels, `None` otherwise.
pub fn exchange_rate_label(amount: u64, total: Decimal, channel: &PaymentChannel) -> Option<String> {
    if !channel.is_cny() {
        return None;
    }
    if amount == 0 || total.is_zero() {
        return Some("¥0.00/ $".to_string());
    }
    let rate = total
        .checked_div(Decimal::from(amount))
        .unwrap_or(Decimal::ZERO);
    Some(format!("¥{}/ $", to_fixed(rate, 2)))
}

/// Channels ordered for display, highest `sort` first. The first is the default.
pub fn sorted_channels(channels: &[PaymentChannel]) -> Vec<&PaymentChannel> {
    let mut sorted: Vec<&PaymentChannel> = channels.iter().collect();
    sorted.sort_by(|a, b| b.sort.cmp(&a.sort));
    sorted
}

pub fn quote(
    amount: u64,
    channel: &PaymentChannel,
    discounts: &DiscountTable,
    usd_rate: Decimal,
) -> TopupQuote {
    let total = compute_total(amount, channel, discounts, usd_rate);
    TopupQuote {
        amount,
        channel: channel.display_name(),
        currency: channel.currency.to_uppercase(),
        discount: discounts.multiplier(amount),
        fee: compute_fee(amount, channel, discounts),
        total,
        exchange_rate: exchange_rate_label(amount, total, channel),
    }
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn channel(currency: &str, fixed_fee: Decimal, percent_fee: Decimal) -> PaymentChannel {
        PaymentChannel {
            uuid: format!("{}-channel", currency.to_lowercase()),
            name: currency.to_string(),
            icon: String::new(),
            currency: currency.to_string(),
            fixed_fee,
            percent_fee,
            sort: 0,
        }
    }

    #[test]
    fn fixed_fee_ignores_discount() {
        let usd = channel("USD", dec!(2), dec!(0.5));
        let discounts = DiscountTable::from_json(r#"{"50": 0.9}"#).unwrap();
        assert_eq!(compute_fee(50, &usd, &discounts), dec!(2));
        assert_eq!(compute_total(50, &usd, &discounts, dec!(7.2)), dec!(47));
    }

    #[test]
    fn percent_fee_with_cny_conversion() {
        let cny = channel("CNY", Decimal::ZERO, dec!(0.03));
        let discounts = DiscountTable::default();
        assert_eq!(compute_fee(100, &cny, &discounts), dec!(3));
        assert_eq!(compute_total(100, &cny, &discounts, dec!(7.2)), dec!(741.6));
    }

    #[test]
    fn percent_fee_uses_discounted_base() {
        let usd = channel("USD", Decimal::ZERO, dec!(0.1));
        let discounts = DiscountTable::from_json(r#"{"10": 0.9}"#).unwrap();
        assert_eq!(compute_fee(10, &usd, &discounts), dec!(0.9));
        assert_eq!(compute_total(10, &usd, &discounts, dec!(7)), dec!(9.9));
    }

    #[test]
    fn percent_fee_rounds_to_cents() {
        let usd = channel("USD", Decimal::ZERO, dec!(0.006));
        assert_eq!(compute_fee(33, &usd, &DiscountTable::default()), dec!(0.20));
    }

    #[test]
    fn zero_amount_totals_zero() {
        let cny = channel("CNY", dec!(1), Decimal::ZERO);
        assert_eq!(compute_total(0, &cny, &DiscountTable::default(), dec!(7.2)), Decimal::ZERO);
    }

    #[test]
    fn exchange_rate_for_cny_only() {
        let cny = channel("CNY", Decimal::ZERO, dec!(0.03));
        let usd = channel("USD", Decimal::ZERO, dec!(0.03));
        assert_eq!(
            exchange_rate_label(100, dec!(741.6), &cny).as_deref(),
            Some("¥7.42/ $")
        );
        assert!(exchange_rate_label(100, dec!(103), &usd).is_none());
    }

    #[test]
    fn exchange_rate_guards_zero_amount() {
        let cny = channel("CNY", Decimal::ZERO, Decimal::ZERO);
        assert_eq!(exchange_rate_label(0, Decimal::ZERO, &cny).as_deref(), Some("¥0.00/ $"));
    }

    #[test]
    fn validate_requires_channel() {
        assert_eq!(validate_topup("10", 1, None), Err(TopupError::NoChannel));
    }

    #[test]
    fn validate_amount_bounds() {
        let usd = channel("USD", Decimal::ZERO, Decimal::ZERO);
        assert_eq!(validate_topup("10", 5, Some(&usd)), Ok(10));
        assert_eq!(validate_topup("4", 5, Some(&usd)), Err(TopupError::BelowMinimum(5)));
        assert_eq!(validate_topup("0", 0, Some(&usd)), Err(TopupError::BelowMinimum(0)));
        assert_eq!(validate_topup("-3", 1, Some(&usd)), Err(TopupError::BelowMinimum(1)));
        assert_eq!(
            validate_topup("1000001", 1, Some(&usd)),
            Err(TopupError::AboveMaximum(MAX_TOPUP_AMOUNT))
        );
        assert_eq!(validate_topup("1000000", 1, Some(&usd)), Ok(1_000_000));
    }

    #[test]
    fn validate_rejects_non_integers() {
        let usd = channel("USD", Decimal::ZERO, Decimal::ZERO);
        assert_eq!(validate_topup("12.5", 1, Some(&usd)), Err(TopupError::NotPositiveInteger));
        assert_eq!(validate_topup("abc", 1, Some(&usd)), Err(TopupError::NotPositiveInteger));
        assert_eq!(validate_topup("", 1, Some(&usd)), Err(TopupError::NotPositiveInteger));
    }

    #[test]
    fn channels_sort_descending() {
        let mut a = channel("USD", Decimal::ZERO, Decimal::ZERO);
        a.sort = 1;
        let mut b = channel("CNY", Decimal::ZERO, Decimal::ZERO);
        b.sort = 9;
        let list = vec![a, b];
        let sorted = sorted_channels(&list);
        assert_eq!(sorted[0].currency, "CNY");
    }

    #[test]
    fn quote_collects_everything() {
        let cny = channel("CNY", Decimal::ZERO, dec!(0.03));
        let q = quote(100, &cny, &DiscountTable::default(), dec!(7.2));
        assert_eq!(q.fee, dec!(3));
        assert_eq!(q.total, dec!(741.6));
        assert_eq!(q.discount, Decimal::ONE);
        assert_eq!(q.exchange_rate.as_deref(), Some("¥7.42/ $"));
        assert_eq!(q.currency, "CNY");
    }

    #[test]
    fn overflowing_discount_yields_zero_total() {
        let cny = channel("CNY", Decimal::ZERO, dec!(0.03));
        let discounts =
            DiscountTable::from_json(r#"{"100": "79228162514264337593543950335"}"#).unwrap();
        assert_eq!(compute_fee(100, &cny, &discounts), Decimal::ZERO);
        assert_eq!(compute_total(100, &cny, &discounts, dec!(7.2)), Decimal::ZERO);
        let q = quote(100, &cny, &discounts, dec!(7.2));
        assert_eq!(q.exchange_rate.as_deref(), Some("¥0.00/ $"));
    }

    #[test]
    fn overflowing_usd_rate_yields_zero_total() {
        let cny = channel("CNY", dec!(1), Decimal::ZERO);
        let total = compute_total(1_000_000, &cny, &DiscountTable::default(), Decimal::MAX);
        assert_eq!(total, Decimal::ZERO);
    }
}
