//! Lens module
//!
//! Lenses combine business logic with the types needed to present results.
//! They are shared by the library API and the CLI.
//!
//! | Lens | Purpose |
//! |------|---------|
//! | `catalog` | Find and validate migration scripts on disk |
//! | `upgrade` | Compare a catalog with a database and apply pending scripts |
//!
//! Each lens module exports:
//! - the main entry point (`ScriptCatalog`, `UpgradeLens`)
//! - **Args structs** describing inputs
//! - **Output types** returned to callers
//!
//! ```rust,ignore
//! use sqlite_upgrade::lens::catalog::{CatalogSearchArgs, ScriptCatalog};
//! use sqlite_upgrade::lens::upgrade::{UpgradeApplyArgs, UpgradeLens, UpgradeStatus};
//! ```

pub mod catalog;
pub mod upgrade;
pub mod utils;
