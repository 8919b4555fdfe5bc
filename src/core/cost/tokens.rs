use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::core::models::breakdown::{TokenBreakdown, TokenDetail};
use crate::core::models::log::{LogEntry, TokenCategory, TokenSide};

/// Reconcile an entry's raw token counts with its per-category ratios.
///
/// Each category with a positive raw count contributes `ceil(count * (ratio - 1))`
/// to the input or output total, depending on [`TokenCategory::side`]. Rounding
/// is per category, never on the running total. Categories whose ratio is 1
/// are still listed so the log view can show them as unadjusted.
pub fn calculate_tokens(entry: &LogEntry) -> TokenBreakdown {
    let metadata = match &entry.metadata {
        Some(m) if entry.prompt_tokens != 0 => m,
        _ => {
            return TokenBreakdown {
                total_input_tokens: entry.prompt_tokens,
                total_output_tokens: entry.completion_tokens,
                show: false,
                token_details: Vec::new(),
            }
        }
    };

    let mut total_input_tokens = entry.prompt_tokens;
    let mut total_output_tokens = entry.completion_tokens;
    let mut token_details = Vec::new();

    for category in TokenCategory::ALL {
        let value = metadata.usage.count(category);
        if value <= Decimal::ZERO {
            continue;
        }
        let rate = metadata.usage.ratio(category);
        let tokens = adjustment(value, rate);

        match category.side() {
            TokenSide::Input => total_input_tokens = total_input_tokens.saturating_add(tokens),
            TokenSide::Output => total_output_tokens = total_output_tokens.saturating_add(tokens),
        }

        token_details.push(TokenDetail {
            category,
            value,
            rate,
            tokens,
        });
    }

    TokenBreakdown {
        total_input_tokens,
        total_output_tokens,
        show: !token_details.is_empty(),
        token_details,
    }
}

fn adjustment(value: Decimal, rate: Decimal) -> i64 {
    let delta = rate
        .checked_sub(Decimal::ONE)
        .and_then(|r| value.checked_mul(r))
        .map(|d| d.ceil())
        .and_then(|d| d.to_i64());
    match delta {
        Some(d) => d,
        None => {
            log::warn!("token adjustment {} * ({} - 1) overflowed, ignoring", value, rate);
            0
        }
    }
}
