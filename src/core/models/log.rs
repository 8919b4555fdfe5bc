use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Log type the backend uses for a billed model call.
pub const LOG_TYPE_CONSUME: i32 = 2;

/// Which running total a token category adjusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSide {
    Input,
    Output,
}

/// Token categories reported in `LogEntry.metadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenCategory {
    #[serde(rename = "input_text_tokens")]
    InputText,
    #[serde(rename = "output_text_tokens")]
    OutputText,
    #[serde(rename = "input_audio_tokens")]
    InputAudio,
    #[serde(rename = "output_audio_tokens")]
    OutputAudio,
    #[serde(rename = "cached_tokens")]
    Cached,
    #[serde(rename = "cached_write_tokens")]
    CachedWrite,
    #[serde(rename = "cached_read_tokens")]
    CachedRead,
    #[serde(rename = "reasoning_tokens")]
    Reasoning,
    #[serde(rename = "input_image_tokens")]
    InputImage,
    #[serde(rename = "output_image_tokens")]
    OutputImage,
}

impl TokenCategory {
    /// All categories in display order.
    pub const ALL: [TokenCategory; 10] = [
        Self::InputText,
        Self::OutputText,
        Self::InputAudio,
        Self::OutputAudio,
        Self::Cached,
        Self::CachedWrite,
        Self::CachedRead,
        Self::Reasoning,
        Self::InputImage,
        Self::OutputImage,
    ];

    /// Metadata key holding the raw count.
    pub fn key(&self) -> &'static str {
        match self {
            Self::InputText => "input_text_tokens",
            Self::OutputText => "output_text_tokens",
            Self::InputAudio => "input_audio_tokens",
            Self::OutputAudio => "output_audio_tokens",
            Self::Cached => "cached_tokens",
            Self::CachedWrite => "cached_write_tokens",
            Self::CachedRead => "cached_read_tokens",
            Self::Reasoning => "reasoning_tokens",
            Self::InputImage => "input_image_tokens",
            Self::OutputImage => "output_image_tokens",
        }
    }

    /// Metadata key holding the billing ratio, e.g. `cached_tokens_ratio`.
    pub fn ratio_key(&self) -> String {
        format!("{}_ratio", self.key())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::InputText => "Input text",
            Self::OutputText => "Output text",
            Self::InputAudio => "Input audio",
            Self::OutputAudio => "Output audio",
            Self::Cached => "Cached",
            Self::CachedWrite => "Cache write",
            Self::CachedRead => "Cache read",
            Self::Reasoning => "Reasoning",
            Self::InputImage => "Input image",
            Self::OutputImage => "Output image",
        }
    }

    /// Fixed classification. `OutputText` counts toward the input total;
    /// historical displayed totals depend on it.
    pub fn side(&self) -> TokenSide {
        match self {
            Self::InputText
            | Self::OutputText
            | Self::InputAudio
            | Self::Cached
            | Self::CachedWrite
            | Self::CachedRead
            | Self::InputImage => TokenSide::Input,
            Self::OutputAudio | Self::Reasoning | Self::OutputImage => TokenSide::Output,
        }
    }

    /// Ratio used when the metadata carries none (or zero).
    pub fn default_ratio(&self) -> Decimal {
        Decimal::ONE
    }
}

/// Per-category raw counts and ratios, keyed the way the backend sends them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenUsageMetadata(BTreeMap<String, Value>);

impl TokenUsageMetadata {
    /// Raw count for a category; missing or non-numeric values read as zero.
    pub fn count(&self, category: TokenCategory) -> Decimal {
        self.0
            .get(category.key())
            .and_then(decimal_of)
            .unwrap_or(Decimal::ZERO)
    }

    /// Ratio for a category, falling back to its default when absent or zero.
    pub fn ratio(&self, category: TokenCategory) -> Decimal {
        self.0
            .get(&category.ratio_key())
            .and_then(decimal_of)
            .filter(|r| !r.is_zero())
            .unwrap_or_else(|| category.default_ratio())
    }
}

/// Read a JSON scalar as an exact decimal, going through its textual form
/// so that `0.1` stays `0.1`.
fn decimal_of(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// `metadata` object of a log entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_ratio: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_ratio: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_ratio: Option<Decimal>,
    /// Time to first response in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_response: Option<u64>,
    #[serde(flatten)]
    pub usage: TokenUsageMetadata,
}

impl LogMetadata {
    /// Group discount, defaulting to 1 when absent or zero.
    pub fn group_discount(&self) -> Decimal {
        self.group_ratio
            .filter(|r| !r.is_zero())
            .unwrap_or(Decimal::ONE)
    }

    pub fn is_times_priced(&self) -> bool {
        self.price_type.as_deref() == Some("times")
    }
}

/// One billed API call as returned by the log endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub id: i64,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: i64,
    #[serde(rename = "type", default)]
    pub log_type: i32,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub token_name: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub quota: i64,
    #[serde(default)]
    pub prompt_tokens: i64,
    #[serde(default)]
    pub completion_tokens: i64,
    /// Total request time in milliseconds.
    #[serde(default)]
    pub request_time: u64,
    #[serde(default)]
    pub is_stream: bool,
    #[serde(default)]
    pub metadata: Option<LogMetadata>,
}

impl LogEntry {
    pub fn is_consume(&self) -> bool {
        self.log_type == LOG_TYPE_CONSUME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn classification_matches_fixed_table() {
        let input: Vec<_> = TokenCategory::ALL
            .iter()
            .filter(|c| c.side() == TokenSide::Input)
            .map(|c| c.key())
            .collect();
        assert_eq!(
            input,
            vec![
                "input_text_tokens",
                "output_text_tokens",
                "input_audio_tokens",
                "cached_tokens",
                "cached_write_tokens",
                "cached_read_tokens",
                "input_image_tokens",
            ]
        );
        let output: Vec<_> = TokenCategory::ALL
            .iter()
            .filter(|c| c.side() == TokenSide::Output)
            .map(|c| c.key())
            .collect();
        assert_eq!(
            output,
            vec!["output_audio_tokens", "reasoning_tokens", "output_image_tokens"]
        );
    }

    #[test]
    fn ratio_key_appends_suffix() {
        assert_eq!(TokenCategory::Cached.ratio_key(), "cached_tokens_ratio");
    }

    #[test]
    fn parse_entry_with_metadata() {
        let json = r#"{
            "id": 7,
            "type": 2,
            "quota": 1500,
            "prompt_tokens": 1000,
            "completion_tokens": 20,
            "request_time": 2500,
            "metadata": {
                "group_ratio": 0.8,
                "input_ratio": 1.5,
                "output_ratio": 6,
                "cached_tokens": 100,
                "cached_tokens_ratio": 0.1,
                "first_response": 500
            }
        }"#;
        let entry: LogEntry = serde_json::from_str(json).unwrap();
        assert!(entry.is_consume());
        let meta = entry.metadata.unwrap();
        assert_eq!(meta.group_discount(), dec!(0.8));
        assert_eq!(meta.input_ratio, Some(dec!(1.5)));
        assert_eq!(meta.first_response, Some(500));
        assert_eq!(meta.usage.count(TokenCategory::Cached), dec!(100));
        assert_eq!(meta.usage.ratio(TokenCategory::Cached), dec!(0.1));
    }

    #[test]
    fn missing_and_zero_ratios_use_default() {
        let usage: TokenUsageMetadata = serde_json::from_value(serde_json::json!({
            "reasoning_tokens": 10,
            "cached_tokens_ratio": 0
        }))
        .unwrap();
        assert_eq!(usage.ratio(TokenCategory::Reasoning), Decimal::ONE);
        assert_eq!(usage.ratio(TokenCategory::Cached), Decimal::ONE);
    }

    #[test]
    fn non_numeric_count_reads_as_zero() {
        let usage: TokenUsageMetadata =
            serde_json::from_value(serde_json::json!({"cached_tokens": true})).unwrap();
        assert_eq!(usage.count(TokenCategory::Cached), Decimal::ZERO);
    }

    #[test]
    fn group_discount_defaults_to_one() {
        let meta = LogMetadata::default();
        assert_eq!(meta.group_discount(), Decimal::ONE);
        assert!(!meta.is_times_priced());
    }
}
