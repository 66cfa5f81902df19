//! Error types for sqlite-upgrade
//!
//! Catalog validation errors are raised eagerly when scripts are searched,
//! never deferred to apply time. Apply errors always name the script that
//! failed so callers can fix it and retry.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, UpgradeError>;

/// Error type for catalog building and script application
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// A path that must be a directory is missing or is not a directory
    #[error("'{}' must be a directory", .path.display())]
    NotADirectory { path: PathBuf },

    /// The database path points at a directory
    #[error("'{}' is a directory", .path.display())]
    IsADirectory { path: PathBuf },

    /// The naming pattern does not compile or lacks exactly three groups
    #[error("invalid script pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Schema name is empty
    #[error("schema name must not be empty")]
    InvalidSchemaName,

    /// The version group of a matching file is not a usable version number
    #[error("script '{file_name}' has an invalid version '{value}' (expected 0..={max})", max = i32::MAX)]
    InvalidVersion { file_name: String, value: String },

    /// Two scripts share the same version number
    #[error("script versions are not unique: version {version} used by '{}' and '{}'", .first.display(), .second.display())]
    DuplicateVersion {
        version: u32,
        first: PathBuf,
        second: PathBuf,
    },

    /// A script category is not one of full, upgrade or mandatory
    #[error("script '{file_name}' has category '{category}', expected 'full', 'upgrade' or 'mandatory'")]
    InvalidCategory { file_name: String, category: String },

    /// No file matched the naming pattern
    #[error("no SQL script found for '{pattern}' pattern in '{}'", .path.display())]
    NoScriptsFound { pattern: String, path: PathBuf },

    /// The lowest versioned script is not a full schema script
    #[error("the first sql script should be a 'full' schema, found '{file_name}' ({category})")]
    MissingFullSchema { file_name: String, category: String },

    /// More than one full schema script was found
    #[error("only one 'full' schema allowed, found '{first}' and '{second}'")]
    MultipleFullSchemas { first: String, second: String },

    /// A script could not be read at apply time
    #[error("failed to read script '{}': {source}", .path.display())]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A script failed while executing
    #[error("script '{file_name}' (version {version}) failed: {source}")]
    ScriptExecution {
        version: u32,
        file_name: String,
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The database holds a negative user_version
    #[error("database user_version {value} is negative")]
    InvalidStoredVersion { value: i64 },

    /// A status or apply call was made before any catalog was built
    #[error("no script catalog available, search for scripts first")]
    CatalogNotBuilt,

    /// A directory could not be listed while scanning for scripts
    #[error("failed to scan '{}': {source}", .path.display())]
    DirectoryScan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other SQLite failure (open, pragma read/write, transactions)
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl UpgradeError {
    /// Whether the error was raised while building a catalog
    pub fn is_catalog_error(&self) -> bool {
        matches!(
            self,
            Self::NotADirectory { .. }
                | Self::InvalidPattern { .. }
                | Self::InvalidSchemaName
                | Self::InvalidVersion { .. }
                | Self::DuplicateVersion { .. }
                | Self::InvalidCategory { .. }
                | Self::NoScriptsFound { .. }
                | Self::MissingFullSchema { .. }
                | Self::MultipleFullSchemas { .. }
                | Self::DirectoryScan { .. }
        )
    }
}
