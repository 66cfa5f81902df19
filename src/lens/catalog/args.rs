//! Catalog lens arguments
//!
//! These arguments describe one script search. They are usually built in code
//! or from `UpgradeConfig::search_args`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::pattern::DEFAULT_SCRIPT_PATTERN;

/// Arguments for a script search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSearchArgs {
    /// Schema name substituted for `{schema_name}` in the pattern
    pub schema_name: String,

    /// Directory holding the SQL scripts
    pub search_path: PathBuf,

    /// Search subdirectories as well
    #[serde(default)]
    pub recursive: bool,

    /// Script file name pattern
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

fn default_pattern() -> String {
    DEFAULT_SCRIPT_PATTERN.to_string()
}

impl CatalogSearchArgs {
    /// Search `search_path` (top level only) with the default pattern
    pub fn new(schema_name: impl Into<String>, search_path: impl Into<PathBuf>) -> Self {
        Self {
            schema_name: schema_name.into(),
            search_path: search_path.into(),
            recursive: false,
            pattern: default_pattern(),
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }
}
