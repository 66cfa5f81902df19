//! Upgrade lens arguments

use serde::{Deserialize, Serialize};

/// Arguments for applying pending scripts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct UpgradeApplyArgs {
    /// Apply only the next pending script
    #[cfg_attr(feature = "cli", clap(long))]
    #[serde(default)]
    pub one: bool,

    /// Run each script and its version update inside one transaction.
    /// Scripts must then not contain BEGIN/COMMIT or VACUUM.
    #[cfg_attr(feature = "cli", clap(long))]
    #[serde(default)]
    pub transactional: bool,
}

impl UpgradeApplyArgs {
    /// Apply every pending script
    pub fn all() -> Self {
        Self::default()
    }

    /// Apply only the next pending script
    pub fn one() -> Self {
        Self {
            one: true,
            ..Default::default()
        }
    }

    pub fn transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }
}
