use serde::Serialize;

use crate::core::models::log::LogEntry;

/// Request latency figures for the log view. Display only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestTiming {
    pub request_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_response_secs: Option<f64>,
    /// Completion tokens per second over the streaming window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_per_sec: Option<f64>,
}

impl RequestTiming {
    pub fn from_entry(entry: &LogEntry) -> Self {
        let request_secs = entry.request_time as f64 / 1000.0;
        let first_response_secs = entry
            .metadata
            .as_ref()
            .and_then(|m| m.first_response)
            .filter(|&ms| ms > 0)
            .map(|ms| ms as f64 / 1000.0);

        let tokens_per_sec = match first_response_secs {
            Some(first) if entry.completion_tokens > 0 => {
                let stream_secs = request_secs - first;
                if stream_secs > 0.0 {
                    Some(entry.completion_tokens as f64 / stream_secs)
                } else {
                    None
                }
            }
            _ => None,
        };

        Self {
            request_secs,
            first_response_secs,
            tokens_per_sec,
        }
    }

    /// Returns "2.50 S".
    pub fn request_label(&self) -> String {
        format!("{:.2} S", self.request_secs)
    }

    pub fn first_response_label(&self) -> Option<String> {
        self.first_response_secs.map(|s| format!("{:.2} S", s))
    }

    /// Returns "40.00 t/s".
    pub fn throughput_label(&self) -> Option<String> {
        self.tokens_per_sec.map(|t| format!("{:.2} t/s", t))
    }
}
