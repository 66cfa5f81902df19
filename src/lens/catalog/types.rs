//! Catalog types
//!
//! Descriptors are created while scanning and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Kind of a migration script, taken from its file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptCategory {
    /// Baseline script creating the whole schema
    Full,
    /// Optional upgrade, can be deferred
    Upgrade,
    /// Upgrade that must not be skipped
    Mandatory,
}

impl ScriptCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Upgrade => "upgrade",
            Self::Mandatory => "mandatory",
        }
    }
}

impl fmt::Display for ScriptCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScriptCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "upgrade" => Ok(Self::Upgrade),
            "mandatory" => Ok(Self::Mandatory),
            _ => Err(format!(
                "Unknown script category '{}'. Valid categories: full, upgrade, mandatory",
                s
            )),
        }
    }
}

/// Parsed metadata for one migration script file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptDescriptor {
    /// Version number (first capture group)
    pub version: u32,
    /// File name without directory
    pub file_name: String,
    /// Script category (second capture group)
    pub category: ScriptCategory,
    /// Free text description (third capture group)
    pub description: String,
    /// Absolute path of the script
    pub path: PathBuf,
}

impl ScriptDescriptor {
    pub fn is_full(&self) -> bool {
        self.category == ScriptCategory::Full
    }

    pub fn is_mandatory(&self) -> bool {
        self.category == ScriptCategory::Mandatory
    }

    /// Flat row used for table output
    pub fn summary(&self) -> ScriptSummary {
        ScriptSummary {
            version: self.version,
            category: self.category.to_string(),
            description: self.description.clone(),
            file_name: self.file_name.clone(),
        }
    }
}

/// Display row for a script
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "display", derive(tabled::Tabled))]
pub struct ScriptSummary {
    pub version: u32,
    pub category: String,
    pub description: String,
    pub file_name: String,
}
