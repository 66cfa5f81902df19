//! Database module
//!
//! This module wraps the single SQLite file whose schema is being managed.
//!
//! # Architecture
//!
//! ```text
//! database/
//! └── core/           # Foundation
//!     └── connection  # UpgradeDatabase handle (path parts, user_version)
//! ```
//!
//! The only migration state kept in the database is `PRAGMA user_version`.
//! No history table is created.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sqlite_upgrade::database::UpgradeDatabase;
//!
//! let db = UpgradeDatabase::open("data/inventory.db")?;
//! println!("{} is at version {}", db.name(), db.version()?);
//! ```

pub mod core;

pub use core::UpgradeDatabase;
