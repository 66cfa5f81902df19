#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! sqlite-upgrade - create and upgrade SQLite schemas from versioned scripts
//!
//! sqlite-upgrade keeps a SQLite database in step with a directory of SQL
//! scripts. The only state it relies on is the database's own
//! `PRAGMA user_version`: every script carries a version number in its file
//! name, and every script newer than the stored version is applied in order.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | `display` | Table row derives for scripts and reports | `tabled` |
//! | `cli` | Command line binary (default) | `clap`, `tracing-subscriber`, `dotenvy` |
//!
//! ```toml
//! # Library only
//! sqlite-upgrade = { version = "0.1", default-features = false }
//! ```
//!
//! # Script Files
//!
//! Script file names follow a pattern with three capture groups: version,
//! category and description. The default pattern is
//!
//! ```text
//! ^(\d+)_(full|upgrade|mandatory)_{schema_name}_(.*)\.sql$
//! ```
//!
//! e.g. `1_full_inventory_create tables.sql`, `2_upgrade_inventory_add price.sql`.
//! The lowest version must be the single `full` script. `mandatory` scripts
//! mark upgrades that must not be deferred.
//!
//! # Architecture
//!
//! - **[`database`]**: the SQLite handle and its `user_version` counter
//! - **[`lens`]**: business logic
//!   - `catalog`: script discovery and validation
//!   - `upgrade`: pending selection, status and application
//! - **[`session`]**: a database paired with its latest catalog
//! - **[`config`]**: configuration file and environment settings
//! - **[`error`]**: typed errors
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sqlite_upgrade::{CatalogSearchArgs, SchemaUpgrade, UpgradeApplyArgs};
//!
//! let mut session = SchemaUpgrade::open("data/inventory.db")?;
//! session.search_scripts(&CatalogSearchArgs::new("inventory", "sql").recursive(true))?;
//!
//! if session.is_upgrade_mandatory()? {
//!     println!("a mandatory upgrade is pending");
//! }
//!
//! let report = session.apply(&UpgradeApplyArgs::all())?;
//! println!("v{} -> v{}", report.from_version, report.to_version);
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod lens;
pub mod session;

pub use config::UpgradeConfig;
pub use database::UpgradeDatabase;
pub use error::{Result, UpgradeError};
pub use lens::catalog::{
    CatalogSearchArgs, ScriptCatalog, ScriptCategory, ScriptDescriptor, DEFAULT_SCRIPT_PATTERN,
};
pub use lens::upgrade::{
    ApplyReport, UpgradeApplyArgs, UpgradeEvent, UpgradeEventCallback, UpgradeLens, UpgradeStatus,
};
pub use lens::utils::OutputFormat;
pub use session::SchemaUpgrade;
