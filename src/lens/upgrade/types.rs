//! Upgrade lens types
//!
//! Result, status and event types shared by the library and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::lens::catalog::ScriptCategory;

// =============================================================================
// Events
// =============================================================================

/// Diagnostic events emitted while applying scripts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeEvent {
    /// An apply run has started
    Started {
        /// Database version before the run
        from_version: u32,
        /// Number of scripts pending at the start of the run
        pending: usize,
    },
    /// A script is about to be executed
    ScriptStarted { version: u32, file_name: String },
    /// A script ran but left `user_version` below its own version, which was
    /// then forced to the script version
    VersionCorrected {
        version: u32,
        file_name: String,
        /// Version found in the database after the script ran
        found: u32,
    },
    /// A pending script was skipped because the database version already
    /// covers it (an earlier script advanced the version further)
    ScriptSkipped {
        version: u32,
        file_name: String,
        database_version: u32,
    },
    /// A script was applied
    ScriptApplied { version: u32, file_name: String },
    /// An apply run has completed
    Completed { applied: usize, to_version: u32 },
}

impl UpgradeEvent {
    /// Whether this event reports a condition worth a warning
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::VersionCorrected { .. } | Self::ScriptSkipped { .. }
        )
    }
}

/// Type alias for upgrade event callbacks
///
/// The callback receives every `UpgradeEvent` emitted by an apply run. It can
/// be used to report progress, or to collect warnings.
pub type UpgradeEventCallback = Arc<dyn Fn(UpgradeEvent) + Send + Sync>;

// =============================================================================
// Reports
// =============================================================================

/// One script applied by an apply run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "display", derive(tabled::Tabled))]
pub struct AppliedScript {
    pub version: u32,
    pub category: ScriptCategory,
    pub file_name: String,
    /// True when `user_version` had to be forced after the script ran
    pub corrected: bool,
    pub applied_at: DateTime<Utc>,
}

/// Outcome of an apply run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Database version before the run
    pub from_version: u32,
    /// Database version after the run
    pub to_version: u32,
    /// Scripts applied, in order
    pub applied: Vec<AppliedScript>,
}

impl ApplyReport {
    /// Number of scripts applied
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Number of scripts that did not set `user_version` themselves
    pub fn corrected_count(&self) -> usize {
        self.applied.iter().filter(|s| s.corrected).count()
    }

    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

// =============================================================================
// Status
// =============================================================================

/// Status of a database relative to a script catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpgradeStatus {
    /// Database is at version 0 and the full script has not run yet
    NotInitialized { latest_version: u32 },

    /// All scripts are applied
    Current { version: u32 },

    /// Scripts are pending
    UpgradeAvailable {
        from: u32,
        to: u32,
        pending: usize,
        mandatory: bool,
    },

    /// Database version is above every script in the catalog
    Ahead {
        database_version: u32,
        latest_version: u32,
    },
}

impl UpgradeStatus {
    /// Whether applying would execute at least one script
    pub fn is_upgrade_available(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized { .. } | Self::UpgradeAvailable { .. }
        )
    }

    pub fn is_mandatory(&self) -> bool {
        matches!(
            self,
            Self::UpgradeAvailable {
                mandatory: true,
                ..
            }
        )
    }
}

impl fmt::Display for UpgradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized { latest_version } => {
                write!(f, "not initialized (latest script v{})", latest_version)
            }
            Self::Current { version } => write!(f, "up to date (v{})", version),
            Self::UpgradeAvailable {
                from,
                to,
                pending,
                mandatory,
            } => write!(
                f,
                "{} upgrade available: v{} -> v{} ({} script{})",
                if *mandatory { "mandatory" } else { "optional" },
                from,
                to,
                pending,
                if *pending == 1 { "" } else { "s" }
            ),
            Self::Ahead {
                database_version,
                latest_version,
            } => write!(
                f,
                "database v{} is ahead of the latest script v{}",
                database_version, latest_version
            ),
        }
    }
}
