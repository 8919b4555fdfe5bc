use colored::{control, Colorize};

use crate::core::config::BillingConfig;
use crate::core::cost::timing::RequestTiming;
use crate::core::formatter::{format_timestamp, render_quota, thousands_separator};
use crate::core::models::breakdown::{CostExplanation, TokenBreakdown, TopupQuote};
use crate::core::models::log::LogEntry;

/// Render one log entry block as a colored (or plain) string.
///
/// Layout:
/// ```text
///  gpt-4o #7  2024-05-01 10:00:00
///   Quota     $0.002000
///   Input     1,000 -> 950
///             Cached: 100 * (0.5 - 1) = -50
///   Output    100
///   Price     Input: $2 / 1M tokens
///             Output: $4 / 1M tokens
///   Original  Original input: $2 / 1M tokens
///   Steps     Calculation: (950 / 1000000 * 2) + (100 / 1000000 * 4) = $0.002000
///   Time      2.50 S, first 0.50 S, 50.00 t/s
/// ```
pub fn render_log_entry(
    entry: &LogEntry,
    tokens: &TokenBreakdown,
    cost: &CostExplanation,
    timing: &RequestTiming,
    billing: &BillingConfig,
    use_color: bool,
) -> String {
    control::set_override(use_color);

    let mut lines: Vec<String> = Vec::new();

    let model = if entry.model_name.is_empty() {
        "(unknown model)"
    } else {
        entry.model_name.as_str()
    };
    let mut header = format!(" {} #{}", model, entry.id);
    if entry.created_at > 0 {
        header.push_str(&format!("  {}", format_timestamp(entry.created_at)));
    }
    lines.push(header.bold().to_string());

    lines.push(format!(
        "  {}     {}",
        "Quota".cyan(),
        render_quota(entry.quota, 6, billing)
    ));

    let input = if tokens.show && tokens.total_input_tokens != entry.prompt_tokens {
        format!(
            "{} -> {}",
            thousands_separator(entry.prompt_tokens),
            thousands_separator(tokens.total_input_tokens)
        )
    } else {
        thousands_separator(entry.prompt_tokens)
    };
    lines.push(format!("  {}     {}", "Input".cyan(), input));
    for detail in &tokens.token_details {
        lines.push(format!(
            "            {}",
            format!(
                "{}: {} * ({} - 1) = {}",
                detail.category.label(),
                detail.value.normalize(),
                detail.rate.normalize(),
                detail.tokens
            )
            .dimmed()
        ));
    }

    let output = if tokens.show && tokens.total_output_tokens != entry.completion_tokens {
        format!(
            "{} -> {}",
            thousands_separator(entry.completion_tokens),
            thousands_separator(tokens.total_output_tokens)
        )
    } else {
        thousands_separator(entry.completion_tokens)
    };
    lines.push(format!("  {}    {}", "Output".cyan(), output));

    match cost {
        CostExplanation::Flat {
            content,
            free,
            illustrate,
        } => {
            if *free {
                lines.push(format!("  {}     {}", "Price".cyan(), "Free".green()));
            } else if !content.is_empty() {
                lines.push(format!("  {}     {}", "Price".cyan(), content));
            }
            if *illustrate {
                lines.push(format!(
                    "            {}",
                    "Charge computed by the backend; no ratios recorded".dimmed()
                ));
            }
        }
        CostExplanation::Priced(price) => {
            lines.push(format!("  {}     {}", "Price".cyan(), price.input_price_info()));
            if let Some(info) = price.output_price_info() {
                lines.push(format!("            {}", info));
            }
            lines.push(format!(
                "  {}  {}",
                "Original".cyan(),
                price.original_input_price_info()
            ));
            if let Some(info) = price.original_output_price_info() {
                lines.push(format!("            {}", info));
            }
            if let Some(label) = &price.discount_label {
                lines.push(format!("  {}  {}", "Discount".cyan(), label.yellow()));
            }
            if let Some(steps) = &price.calculate_steps {
                lines.push(format!("  {}     {}", "Steps".cyan(), steps));
            }
        }
    }

    let mut time = timing.request_label();
    if let Some(first) = timing.first_response_label() {
        time.push_str(&format!(", first {}", first));
    }
    if let Some(tps) = timing.throughput_label() {
        time.push_str(&format!(", {}", tps));
    }
    if entry.is_stream {
        time.push_str(", stream");
    }
    lines.push(format!("  {}      {}", "Time".cyan(), time));

    lines.join("\n")
}

/// Render a top-up quote.
pub fn render_topup_quote(quote: &TopupQuote, use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines = vec![format!(" Top-up via {}", quote.channel).bold().to_string()];
    lines.push(format!("  {}    ${}", "Amount".cyan(), quote.amount));
    if quote.discount != rust_decimal::Decimal::ONE {
        lines.push(format!(
            "  {}  {}",
            "Discount".cyan(),
            format!("{}x", quote.discount.normalize()).yellow()
        ));
    }
    lines.push(format!("  {}       {}", "Fee".cyan(), quote.fee.normalize()));
    if let Some(rate) = &quote.exchange_rate {
        lines.push(format!("  {}      {}", "Rate".cyan(), rate));
    }
    lines.push(format!(
        "  {}     {} {}",
        "Total".cyan(),
        quote.total.normalize().to_string().green().bold(),
        quote.currency
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cost::pricing::explain_cost;
    use crate::core::cost::tokens::calculate_tokens;
    use crate::core::cost::topup::quote;
    use crate::core::models::log::LogMetadata;
    use crate::core::models::payment::{DiscountTable, PaymentChannel};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn make_entry() -> LogEntry {
        let usage = serde_json::from_value(json!({
            "cached_tokens": 100,
            "cached_tokens_ratio": 0.5
        }))
        .unwrap();
        LogEntry {
            id: 7,
            log_type: 2,
            model_name: "gpt-4o".into(),
            quota: 1_000,
            prompt_tokens: 1_000,
            completion_tokens: 100,
            request_time: 2_500,
            metadata: Some(LogMetadata {
                input_ratio: Some(dec!(1)),
                output_ratio: Some(dec!(2)),
                group_ratio: Some(dec!(0.8)),
                first_response: Some(500),
                usage,
                ..LogMetadata::default()
            }),
            ..LogEntry::default()
        }
    }

    fn render(entry: &LogEntry) -> String {
        let billing = BillingConfig::default();
        let tokens = calculate_tokens(entry);
        let cost = explain_cost(entry, &tokens, &billing);
        let timing = RequestTiming::from_entry(entry);
        render_log_entry(entry, &tokens, &cost, &timing, &billing, false)
    }

    #[test]
    fn render_contains_model_and_totals() {
        let output = render(&make_entry());
        assert!(output.contains("gpt-4o #7"));
        assert!(output.contains("1,000 -> 950"));
        assert!(output.contains("Cached: 100 * (0.5 - 1) = -50"));
        assert!(output.contains("$0.002000"));
    }

    #[test]
    fn render_contains_prices_and_discount() {
        let output = render(&make_entry());
        assert!(output.contains("Input: $1.6 / 1M tokens"));
        assert!(output.contains("Output: $3.2 / 1M tokens"));
        assert!(output.contains("Original input: $2 / 1M tokens"));
        assert!(output.contains("0.80x"));
        assert!(output.contains("Calculation: (950 / 1000000 * 1.6)"));
    }

    #[test]
    fn render_contains_timing() {
        let output = render(&make_entry());
        assert!(output.contains("2.50 S, first 0.50 S, 50.00 t/s"));
    }

    #[test]
    fn render_flat_free_entry() {
        let entry = LogEntry {
            log_type: 2,
            model_name: "free-model".into(),
            ..LogEntry::default()
        };
        let output = render(&entry);
        assert!(output.contains("Free"));
    }

    #[test]
    fn render_no_ansi_when_color_false() {
        let output = render(&make_entry());
        assert!(!output.contains('\x1b'), "output should not contain ANSI codes");
    }

    #[test]
    fn render_topup_quote_cny() {
        let channel = PaymentChannel {
            uuid: "alipay".into(),
            name: "Alipay".into(),
            icon: String::new(),
            currency: "CNY".into(),
            fixed_fee: Decimal::ZERO,
            percent_fee: dec!(0.03),
            sort: 0,
        };
        let q = quote(100, &channel, &DiscountTable::default(), dec!(7.2));
        let output = render_topup_quote(&q, false);
        assert!(output.contains("Alipay (CNY)"));
        assert!(output.contains("¥7.42/ $"));
        assert!(output.contains("741.6 CNY"));
        assert!(!output.contains("Discount"));
    }
}
