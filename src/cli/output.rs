use std::io::IsTerminal;

use serde::Serialize;

use crate::core::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub pretty: bool,
    pub use_color: bool,
    pub verbose: bool,
}

impl OutputOptions {
    /// Command-line flags win over the config file's settings.
    pub fn resolve(
        settings: &Settings,
        format_flag: Option<&str>,
        json_flag: bool,
        pretty: bool,
        no_color: bool,
        verbose: bool,
    ) -> Self {
        let format = if json_flag {
            OutputFormat::Json
        } else {
            match format_flag.unwrap_or(settings.default_format.as_str()) {
                "json" => OutputFormat::Json,
                _ => OutputFormat::Text,
            }
        };
        let use_color = match settings.color.as_str() {
            _ if no_color => false,
            "always" => true,
            "never" => false,
            _ => detect_color(true),
        };
        Self {
            format,
            pretty,
            use_color,
            verbose,
        }
    }

    pub fn to_json<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

pub fn detect_color(color_flag: bool) -> bool {
    if !color_flag {
        return false;
    }
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    std::io::stdout().is_terminal()
}
