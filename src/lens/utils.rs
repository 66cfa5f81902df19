//! Common utility functions for lens modules
//!
//! Output format selection shared by every command, plus small helpers for
//! rendering catalog rows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default maximum length for descriptions in tables
pub const DEFAULT_DESCRIPTION_MAX_LEN: usize = 40;

/// Unified output format for all commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Rounded table (default)
    #[default]
    Table,
    /// Markdown table
    Markdown,
    /// Compact JSON
    Json,
    /// Indented JSON
    JsonPretty,
    /// Pipe-separated values with header
    Psv,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty)
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table | Self::Markdown)
    }

    pub fn all_names() -> &'static [&'static str] {
        &["table", "markdown", "json", "json-pretty", "psv"]
    }

    /// Serialize `value` as JSON in this format's style
    ///
    /// Non-JSON formats fall back to compact JSON.
    pub fn to_json<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        match self {
            Self::JsonPretty => serde_json::to_string_pretty(value),
            _ => serde_json::to_string(value),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Table => "table",
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::JsonPretty => "json-pretty",
            Self::Psv => "psv",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "json-pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            "psv" | "pipe" => Ok(Self::Psv),
            _ => Err(format!(
                "Unknown output format '{}'. Valid formats: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}

/// Shorten `text` to `max_len` characters, ending with "..." when cut
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}
