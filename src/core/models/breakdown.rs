use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::models::log::TokenCategory;

/// One rate-adjusted category of a log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenDetail {
    pub category: TokenCategory,
    /// Raw count from the metadata.
    pub value: Decimal,
    pub rate: Decimal,
    /// `ceil(value * (rate - 1))`, may be negative.
    pub tokens: i64,
}

/// Adjusted token totals for a log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenBreakdown {
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub show: bool,
    pub token_details: Vec<TokenDetail>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    /// Flat price per call.
    Times,
    /// Price per million tokens.
    Tokens,
}

/// Prices reconstructed from a log entry's ratios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub price_type: PriceType,
    pub group_discount: Decimal,
    pub input_price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_price: Option<String>,
    pub original_input_price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_output_price: Option<String>,
    /// Present only when the group discount differs from 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculate_steps: Option<String>,
}

impl PriceBreakdown {
    pub fn input_price_info(&self) -> String {
        match self.price_type {
            PriceType::Times => format!("Per call: ${}", self.input_price),
            PriceType::Tokens => format!("Input: ${} / 1M tokens", self.input_price),
        }
    }

    pub fn output_price_info(&self) -> Option<String> {
        self.output_price
            .as_ref()
            .map(|p| format!("Output: ${} / 1M tokens", p))
    }

    pub fn original_input_price_info(&self) -> String {
        match self.price_type {
            PriceType::Times => format!("Original per call: ${}", self.original_input_price),
            PriceType::Tokens => format!(
                "Original input: ${} / 1M tokens",
                self.original_input_price
            ),
        }
    }

    pub fn original_output_price_info(&self) -> Option<String> {
        self.original_output_price
            .as_ref()
            .map(|p| format!("Original output: ${} / 1M tokens", p))
    }
}

/// What the log view can say about an entry's cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostExplanation {
    /// Entry carries no ratios; only the backend's content string is known.
    Flat {
        content: String,
        free: bool,
        /// Whether a non-zero charge needs the "computed by backend" note.
        illustrate: bool,
    },
    Priced(PriceBreakdown),
}

/// Fee and payable total for a top-up request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopupQuote {
    pub amount: u64,
    pub channel: String,
    pub currency: String,
    pub discount: Decimal,
    pub fee: Decimal,
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<String>,
}
