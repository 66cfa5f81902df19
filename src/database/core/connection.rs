//! Database connection management
//!
//! This module provides the database handle the upgrade engine runs against.
//! The handle owns one SQLite connection for its whole lifetime; the
//! connection is closed when the handle is dropped.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::debug;

use crate::error::{Result, UpgradeError};

/// Database handle tracked through `PRAGMA user_version`
///
/// `UpgradeDatabase` opens (or creates) a SQLite file and exposes the version
/// counter stored inside it. The counter is always read from the database
/// itself, so scripts that update `user_version` on their own are observed
/// immediately.
pub struct UpgradeDatabase {
    conn: Connection,
    full_path: PathBuf,
    directory: PathBuf,
    name: String,
    extension: String,
}

impl UpgradeDatabase {
    /// Open the database at the specified path, creating an empty one if needed
    ///
    /// The parent directory must exist and the path must not be a directory.
    /// A freshly created database always reports version 0.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let full_path = path.as_ref().to_path_buf();

        let directory = match full_path.parent() {
            Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
            Some(p) => p.to_path_buf(),
            None => PathBuf::from("."),
        };
        if !directory.is_dir() {
            return Err(UpgradeError::NotADirectory { path: directory });
        }
        if full_path.is_dir() {
            return Err(UpgradeError::IsADirectory { path: full_path });
        }

        let name = full_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = full_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let conn = Connection::open(&full_path)?;

        let db = UpgradeDatabase {
            conn,
            full_path,
            directory,
            name,
            extension,
        };

        let version = db.raw_version()?;
        debug!(db = %db.full_path.display(), version, "database opened");

        Ok(db)
    }

    /// Full path of the database file, as given when opening
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Directory holding the database file
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Base name of the database file without extension
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extension of the database file including the leading dot, or empty
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Read the version of the last executed SQL script
    ///
    /// Fails with `InvalidStoredVersion` when the stored value is negative.
    pub fn version(&self) -> Result<u32> {
        let value = self.raw_version()?;
        u32::try_from(value).map_err(|_| UpgradeError::InvalidStoredVersion { value })
    }

    /// Stored `user_version` as SQLite reports it, without validation
    pub fn raw_version(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    /// Overwrite the stored version
    ///
    /// Callers are responsible for never lowering the counter.
    pub fn set_version(&self, version: u32) -> Result<()> {
        self.conn
            .execute_batch(&format!("PRAGMA user_version = {}", version))?;
        Ok(())
    }

    /// Execute a batch of SQL statements as written
    pub fn execute_batch(&self, sql: &str) -> rusqlite::Result<()> {
        self.conn.execute_batch(sql)
    }

    /// Begin an unchecked transaction
    ///
    /// The transaction rolls back when dropped without `commit`.
    pub fn transaction(&self) -> Result<rusqlite::Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    /// Check if a table exists in the database
    #[cfg(test)]
    pub(crate) fn table_exists(&self, table_name: &str) -> Result<bool> {
        let count: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Close the connection, reporting any error raised while closing
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| UpgradeError::Database(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_database_with_version_zero() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Test1.db");

        let db = UpgradeDatabase::open(&path).unwrap();
        assert_eq!(db.version().unwrap(), 0);
    }

    #[test]
    fn test_path_components() {
        let dir = TempDir::new().unwrap();
        let db = UpgradeDatabase::open(dir.path().join("inventory.sqlite3")).unwrap();

        assert_eq!(db.name(), "inventory");
        assert_eq!(db.extension(), ".sqlite3");
        assert_eq!(db.directory(), dir.path());

        let db = UpgradeDatabase::open(dir.path().join("plain")).unwrap();
        assert_eq!(db.name(), "plain");
        assert_eq!(db.extension(), "");
    }

    #[test]
    fn test_open_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("test.db");

        let result = UpgradeDatabase::open(&path);
        assert!(matches!(result, Err(UpgradeError::NotADirectory { .. })));
    }

    #[test]
    fn test_open_directory_path() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("db.sqlite")).unwrap();

        let result = UpgradeDatabase::open(dir.path().join("db.sqlite"));
        assert!(matches!(result, Err(UpgradeError::IsADirectory { .. })));
    }

    #[test]
    fn test_version_round_trip_and_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");

        let db = UpgradeDatabase::open(&path).unwrap();
        db.set_version(7).unwrap();
        assert_eq!(db.version().unwrap(), 7);
        db.close().unwrap();

        let db = UpgradeDatabase::open(&path).unwrap();
        assert_eq!(db.version().unwrap(), 7);
    }

    #[test]
    fn test_version_set_by_script() {
        let dir = TempDir::new().unwrap();
        let db = UpgradeDatabase::open(dir.path().join("test.db")).unwrap();

        db.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY); PRAGMA user_version = 3;")
            .unwrap();
        assert_eq!(db.version().unwrap(), 3);
        assert!(db.table_exists("t").unwrap());
        assert!(!db.table_exists("nonexistent_table").unwrap());
    }

    #[test]
    fn test_negative_stored_version() {
        let dir = TempDir::new().unwrap();
        let db = UpgradeDatabase::open(dir.path().join("test.db")).unwrap();

        db.execute_batch("PRAGMA user_version = -4;").unwrap();
        assert!(matches!(
            db.version(),
            Err(UpgradeError::InvalidStoredVersion { value: -4 })
        ));
        drop(db);

        // still opens, the bad value stays readable
        let db = UpgradeDatabase::open(dir.path().join("test.db")).unwrap();
        assert_eq!(db.raw_version().unwrap(), -4);
        assert!(db.version().is_err());
    }

    #[test]
    fn test_transaction_rolls_back_on_drop() {
        let dir = TempDir::new().unwrap();
        let db = UpgradeDatabase::open(dir.path().join("test.db")).unwrap();

        {
            let tx = db.transaction().unwrap();
            tx.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();
        }
        assert!(!db.table_exists("t").unwrap());
    }
}
