use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::config::BillingConfig;

/// Round half away from zero to `digits` places and print exactly that many.
pub fn to_fixed(value: Decimal, digits: u32) -> String {
    let rounded = value.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", digits as usize, rounded)
}

/// Product of `factors`, or `None` if any step overflows.
pub fn checked_product(factors: &[Decimal]) -> Option<Decimal> {
    factors
        .iter()
        .try_fold(Decimal::ONE, |acc, f| acc.checked_mul(*f))
}

/// Convert quota to a currency amount string with `digits` decimals.
pub fn quota_to_amount(quota: i64, digits: u32, billing: &BillingConfig) -> String {
    let per_unit = billing.effective_quota_per_unit();
    let amount = Decimal::from(quota)
        .checked_div(per_unit)
        .unwrap_or(Decimal::ZERO);
    to_fixed(amount, digits)
}

/// Convert a currency amount to whole quota units, keeping the sign.
pub fn amount_to_quota(amount: Decimal, billing: &BillingConfig) -> i64 {
    let per_unit = billing.effective_quota_per_unit();
    match amount.checked_mul(per_unit) {
        Some(quota) => quota
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or_else(|| {
                log::warn!("quota for amount {} does not fit in i64", amount);
                0
            }),
        None => {
            log::warn!("amount {} overflows quota conversion", amount);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn billing() -> BillingConfig {
        BillingConfig::default()
    }

    #[test]
    fn checked_product_detects_overflow() {
        assert_eq!(checked_product(&[dec!(2), dec!(0.5), dec!(3)]), Some(dec!(3)));
        assert_eq!(checked_product(&[]), Some(Decimal::ONE));
        assert_eq!(checked_product(&[Decimal::MAX, dec!(10)]), None);
    }

    #[test]
    fn quota_to_amount_default_scale() {
        assert_eq!(quota_to_amount(500_000, 2, &billing()), "1.00");
        assert_eq!(quota_to_amount(1_250_000, 2, &billing()), "2.50");
        assert_eq!(quota_to_amount(0, 2, &billing()), "0.00");
    }

    #[test]
    fn quota_to_amount_respects_digits() {
        assert_eq!(quota_to_amount(1, 6, &billing()), "0.000002");
        assert_eq!(quota_to_amount(123_456, 4, &billing()), "0.2469");
    }

    #[test]
    fn quota_to_amount_keeps_sign() {
        assert_eq!(quota_to_amount(-250_000, 2, &billing()), "-0.50");
    }

    #[test]
    fn amount_to_quota_is_exact() {
        assert_eq!(amount_to_quota(dec!(0.1), &billing()), 50_000);
        assert_eq!(amount_to_quota(dec!(19.99), &billing()), 9_995_000);
        assert_eq!(amount_to_quota(dec!(0.000001), &billing()), 1);
    }

    #[test]
    fn amount_to_quota_preserves_negative() {
        assert_eq!(amount_to_quota(dec!(-2.5), &billing()), -1_250_000);
    }

    #[test]
    fn custom_scale() {
        let billing = BillingConfig::new(dec!(1000), true);
        assert_eq!(quota_to_amount(1500, 2, &billing), "1.50");
        assert_eq!(amount_to_quota(dec!(1.5), &billing), 1500);
    }

    #[test]
    fn zero_scale_does_not_divide_by_zero() {
        let billing = BillingConfig::new(Decimal::ZERO, true);
        assert_eq!(quota_to_amount(500_000, 2, &billing), "1.00");
    }

    #[test]
    fn round_trip_within_one_unit() {
        for q in [0i64, 1, 7, 499_999, 500_000, 123_456_789, 9_999_999_999] {
            let amount = Decimal::from_str(&quota_to_amount(q, 6, &billing())).unwrap();
            let back = amount_to_quota(amount, &billing());
            assert!((back - q).abs() <= 1, "{} -> {} -> {}", q, amount, back);
        }
    }

    #[test]
    fn to_fixed_pads_and_rounds_half_away() {
        assert_eq!(to_fixed(dec!(1), 2), "1.00");
        assert_eq!(to_fixed(dec!(0.125), 2), "0.13");
        assert_eq!(to_fixed(dec!(-0.125), 2), "-0.13");
    }
}
