//! Core database infrastructure
//!
//! This module provides the foundational database component used by the
//! upgrade engine:
//! - `UpgradeDatabase`: SQLite handle exposing the `user_version` counter

mod connection;

pub use connection::UpgradeDatabase;
