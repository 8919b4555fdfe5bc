use std::io::Read;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::core::config::BillingConfig;
use crate::core::cost::pricing::explain_cost;
use crate::core::cost::timing::RequestTiming;
use crate::core::cost::tokens::calculate_tokens;
use crate::core::formatter::render_quota;
use crate::core::models::breakdown::{CostExplanation, TokenBreakdown};
use crate::core::models::log::LogEntry;

#[derive(Serialize)]
struct LogReport<'a> {
    id: i64,
    model_name: &'a str,
    quota: i64,
    display_quota: String,
    tokens: TokenBreakdown,
    cost: CostExplanation,
    timing: RequestTiming,
}

/// Accepts a bare array, a single entry, or the API's `{"data": ...}` envelope
/// (possibly nested for paginated responses). A `"success": false` envelope
/// becomes an error carrying the backend's message.
fn parse_entries(content: &str) -> Result<Vec<LogEntry>> {
    let value: Value = serde_json::from_str(content).context("Failed to parse log entries")?;
    collect_entries(value)
}

fn collect_entries(value: Value) -> Result<Vec<LogEntry>> {
    match value {
        Value::Array(_) => {
            serde_json::from_value(value).context("Failed to parse log entries")
        }
        Value::Object(mut fields) => {
            if fields.get("success") == Some(&Value::Bool(false)) {
                let message = fields
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .unwrap_or("request failed");
                bail!("Backend returned an error: {}", message);
            }
            if let Some(data) = fields.remove("data") {
                return match data {
                    Value::Null => Ok(Vec::new()),
                    data => collect_entries(data),
                };
            }
            if !fields.contains_key("id") && !fields.contains_key("model_name") {
                bail!("Not a log entry: expected an \"id\" or \"model_name\" field");
            }
            let entry: LogEntry = serde_json::from_value(Value::Object(fields))
                .context("Failed to parse log entry")?;
            Ok(vec![entry])
        }
        _ => bail!("Expected a log entry, an array of entries, or a {{\"data\": ...}} envelope"),
    }
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
    }
}

/// `qv log <FILE|->`
pub fn run(path: &str, billing: &BillingConfig, opts: &OutputOptions) -> Result<()> {
    let entries = parse_entries(&read_input(path)?)?;
    log::debug!("parsed {} log entries from {}", entries.len(), path);

    if entries.is_empty() {
        eprintln!("No log entries found in {}", path);
        return Ok(());
    }

    match opts.format {
        OutputFormat::Text => {
            let sections: Vec<String> = entries
                .iter()
                .map(|entry| {
                    let tokens = calculate_tokens(entry);
                    let cost = explain_cost(entry, &tokens, billing);
                    let timing = RequestTiming::from_entry(entry);
                    renderer::render_log_entry(
                        entry,
                        &tokens,
                        &cost,
                        &timing,
                        billing,
                        opts.use_color,
                    )
                })
                .collect();
            println!("{}", sections.join("\n\n"));
        }
        OutputFormat::Json => {
            let reports: Vec<LogReport> = entries
                .iter()
                .map(|entry| {
                    let tokens = calculate_tokens(entry);
                    let cost = explain_cost(entry, &tokens, billing);
                    LogReport {
                        id: entry.id,
                        model_name: &entry.model_name,
                        quota: entry.quota,
                        display_quota: render_quota(entry.quota, 6, billing),
                        tokens,
                        cost,
                        timing: RequestTiming::from_entry(entry),
                    }
                })
                .collect();
            println!("{}", opts.to_json(&reports)?);
        }
    }

    Ok(())
}
