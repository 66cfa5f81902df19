//! Upgrade lens
//!
//! This module applies catalog scripts to a database. The database version
//! (`PRAGMA user_version`) is read again for every decision, so a lens can be
//! used repeatedly and an interrupted run can simply be retried: scripts at or
//! below the stored version are never executed again.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlite_upgrade::lens::upgrade::{UpgradeApplyArgs, UpgradeLens};
//!
//! let lens = UpgradeLens::new(&db, &catalog);
//! if lens.has_mandatory_pending()? {
//!     let report = lens.apply(&UpgradeApplyArgs::all())?;
//!     println!("applied {} scripts, now at v{}", report.applied_count(), report.to_version);
//! }
//! ```
//!
//! # Version correction
//!
//! Scripts are expected to end with `PRAGMA user_version = N;`. When a script
//! leaves the version below its own number, the lens sets it and reports a
//! `UpgradeEvent::VersionCorrected` warning. The version is never lowered.

pub mod args;
pub mod types;

pub use args::UpgradeApplyArgs;
pub use types::{AppliedScript, ApplyReport, UpgradeEvent, UpgradeEventCallback, UpgradeStatus};

use chrono::Utc;
use tracing::{debug, warn};

use crate::database::UpgradeDatabase;
use crate::error::{Result, UpgradeError};
use crate::lens::catalog::{ScriptCatalog, ScriptDescriptor};

/// Upgrade lens for applying scripts of a catalog to a database
///
/// This lens provides:
/// - Pending script selection against the live database version
/// - Status queries (upgrade available, mandatory upgrade pending)
/// - Ordered script application with version correction
pub struct UpgradeLens<'a> {
    db: &'a UpgradeDatabase,
    catalog: &'a ScriptCatalog,
    callback: Option<UpgradeEventCallback>,
}

impl<'a> UpgradeLens<'a> {
    /// Create a new upgrade lens
    pub fn new(db: &'a UpgradeDatabase, catalog: &'a ScriptCatalog) -> Self {
        Self {
            db,
            catalog,
            callback: None,
        }
    }

    /// Receive `UpgradeEvent`s while applying
    pub fn with_callback(mut self, callback: UpgradeEventCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn catalog(&self) -> &'a ScriptCatalog {
        self.catalog
    }

    /// Current database version
    pub fn current_version(&self) -> Result<u32> {
        self.db.version()
    }

    /// Scripts newer than the database version, ascending
    pub fn pending_scripts(&self) -> Result<Vec<&'a ScriptDescriptor>> {
        let version = self.db.version()?;
        Ok(self.catalog.newer_than(version).collect())
    }

    /// True if any pending script is mandatory
    pub fn has_mandatory_pending(&self) -> Result<bool> {
        Ok(self.pending_scripts()?.iter().any(|s| s.is_mandatory()))
    }

    /// True if at least one script is pending
    pub fn has_pending(&self) -> Result<bool> {
        Ok(!self.pending_scripts()?.is_empty())
    }

    /// Status of the database relative to the catalog
    pub fn status(&self) -> Result<UpgradeStatus> {
        let version = self.db.version()?;
        let latest_version = self.catalog.latest_version();

        if version > latest_version {
            return Ok(UpgradeStatus::Ahead {
                database_version: version,
                latest_version,
            });
        }

        let pending: Vec<_> = self.catalog.newer_than(version).collect();
        if pending.is_empty() {
            return Ok(UpgradeStatus::Current { version });
        }
        if version == 0 {
            return Ok(UpgradeStatus::NotInitialized { latest_version });
        }

        Ok(UpgradeStatus::UpgradeAvailable {
            from: version,
            to: latest_version,
            pending: pending.len(),
            mandatory: pending.iter().any(|s| s.is_mandatory()),
        })
    }

    /// Apply pending scripts in ascending version order
    ///
    /// Stops at the first failing script. Scripts applied before the failure
    /// stay applied and the database version reflects them.
    pub fn apply(&self, args: &UpgradeApplyArgs) -> Result<ApplyReport> {
        let from_version = self.db.version()?;
        let pending = self.pending_scripts()?;

        self.emit(UpgradeEvent::Started {
            from_version,
            pending: pending.len(),
        });

        let mut applied = Vec::new();
        for script in pending {
            let current = self.db.version()?;
            if script.version <= current {
                warn!(
                    db = %self.db.full_path().display(),
                    script = %script.file_name,
                    version = current,
                    "script skipped, database version already covers it"
                );
                self.emit(UpgradeEvent::ScriptSkipped {
                    version: script.version,
                    file_name: script.file_name.clone(),
                    database_version: current,
                });
                continue;
            }

            debug!(
                db = %self.db.full_path().display(),
                apply = %script.file_name,
                "applying script"
            );
            self.emit(UpgradeEvent::ScriptStarted {
                version: script.version,
                file_name: script.file_name.clone(),
            });

            let corrected = if args.transactional {
                let tx = self.db.transaction()?;
                let corrected = self.run_script(script)?;
                tx.commit()?;
                corrected
            } else {
                self.run_script(script)?
            };

            applied.push(AppliedScript {
                version: script.version,
                category: script.category,
                file_name: script.file_name.clone(),
                corrected,
                applied_at: Utc::now(),
            });
            self.emit(UpgradeEvent::ScriptApplied {
                version: script.version,
                file_name: script.file_name.clone(),
            });

            if args.one {
                break;
            }
        }

        let to_version = self.db.version()?;
        self.emit(UpgradeEvent::Completed {
            applied: applied.len(),
            to_version,
        });

        Ok(ApplyReport {
            from_version,
            to_version,
            applied,
        })
    }

    /// Execute one script; returns true if the version had to be forced
    fn run_script(&self, script: &ScriptDescriptor) -> Result<bool> {
        let sql =
            std::fs::read_to_string(&script.path).map_err(|e| UpgradeError::ScriptRead {
                path: script.path.clone(),
                source: e,
            })?;

        self.db
            .execute_batch(&sql)
            .map_err(|e| UpgradeError::ScriptExecution {
                version: script.version,
                file_name: script.file_name.clone(),
                path: script.path.clone(),
                source: e,
            })?;

        let found = self.db.version()?;
        if found >= script.version {
            return Ok(false);
        }

        // force user_version to the expected version
        self.db.set_version(script.version)?;
        warn!(
            db = %self.db.full_path().display(),
            script = %script.file_name,
            found,
            expected = script.version,
            "script doesn't update user_version correctly"
        );
        self.emit(UpgradeEvent::VersionCorrected {
            version: script.version,
            file_name: script.file_name.clone(),
            found,
        });

        Ok(true)
    }

    fn emit(&self, event: UpgradeEvent) {
        if let Some(callback) = &self.callback {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lens::catalog::{CatalogSearchArgs, ScriptCategory};
    use std::fs;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const FULL_V1: &str = "CREATE TABLE item (id INTEGER PRIMARY KEY, name TEXT);
        PRAGMA user_version = 1;";
    const UPGRADE_V2: &str = "ALTER TABLE item ADD COLUMN price REAL;
        PRAGMA user_version = 2;";

    /// Top-level scripts v1 (full) and v2 (upgrade), plus v3..v5 in a
    /// subdirectory with v4 mandatory.
    fn setup_scripts(dir: &Path) {
        fs::write(dir.join("1_full_SchemaTest_create.sql"), FULL_V1).unwrap();
        fs::write(dir.join("2_upgrade_SchemaTest_price.sql"), UPGRADE_V2).unwrap();

        let sub = dir.join("next");
        fs::create_dir(&sub).unwrap();
        fs::write(
            sub.join("3_upgrade_SchemaTest_stock.sql"),
            "ALTER TABLE item ADD COLUMN stock INTEGER; PRAGMA user_version = 3;",
        )
        .unwrap();
        fs::write(
            sub.join("4_mandatory_SchemaTest_log.sql"),
            "CREATE TABLE log (id INTEGER PRIMARY KEY, msg TEXT); PRAGMA user_version = 4;",
        )
        .unwrap();
        fs::write(
            sub.join("5_upgrade_SchemaTest_index.sql"),
            "CREATE INDEX idx_item_name ON item(name); PRAGMA user_version = 5;",
        )
        .unwrap();
    }

    fn catalog(dir: &Path, db: &UpgradeDatabase, recursive: bool) -> ScriptCatalog {
        let args = CatalogSearchArgs::new("SchemaTest", dir).recursive(recursive);
        ScriptCatalog::build(&args, db).unwrap()
    }

    fn collector() -> (UpgradeEventCallback, Arc<Mutex<Vec<UpgradeEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let callback: UpgradeEventCallback = Arc::new(move |event: UpgradeEvent| {
            sink.lock().unwrap().push(event);
        });
        (callback, events)
    }

    #[test]
    fn test_create_from_empty_database() {
        let dir = TempDir::new().unwrap();
        setup_scripts(dir.path());
        let db = UpgradeDatabase::open(dir.path().join("Test1.db")).unwrap();
        let catalog = catalog(dir.path(), &db, false);
        let lens = UpgradeLens::new(&db, &catalog);

        assert_eq!(
            lens.status().unwrap(),
            UpgradeStatus::NotInitialized { latest_version: 2 }
        );

        let report = lens.apply(&UpgradeApplyArgs::all()).unwrap();
        assert_eq!(report.applied_count(), 2);
        assert_eq!(report.from_version, 0);
        assert_eq!(report.to_version, 2);
        assert_eq!(db.version().unwrap(), 2);
        assert!(!lens.has_pending().unwrap());
        assert!(!lens.has_mandatory_pending().unwrap());
        assert_eq!(lens.status().unwrap(), UpgradeStatus::Current { version: 2 });
        assert!(db.table_exists("item").unwrap());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let dir = TempDir::new().unwrap();
        setup_scripts(dir.path());
        let db = UpgradeDatabase::open(dir.path().join("Test1.db")).unwrap();
        let catalog = catalog(dir.path(), &db, false);
        let lens = UpgradeLens::new(&db, &catalog);

        lens.apply(&UpgradeApplyArgs::all()).unwrap();
        let report = lens.apply(&UpgradeApplyArgs::all()).unwrap();

        assert!(report.is_noop());
        assert_eq!(db.version().unwrap(), 2);
    }

    #[test]
    fn test_recursive_rebuild_finds_mandatory_upgrade() {
        let dir = TempDir::new().unwrap();
        setup_scripts(dir.path());
        let db = UpgradeDatabase::open(dir.path().join("Test1.db")).unwrap();

        let top = catalog(dir.path(), &db, false);
        UpgradeLens::new(&db, &top)
            .apply(&UpgradeApplyArgs::all())
            .unwrap();
        assert!(!UpgradeLens::new(&db, &top).has_mandatory_pending().unwrap());

        let all = catalog(dir.path(), &db, true);
        let lens = UpgradeLens::new(&db, &all);
        assert!(lens.has_pending().unwrap());
        assert!(lens.has_mandatory_pending().unwrap());

        let versions: Vec<u32> = lens
            .pending_scripts()
            .unwrap()
            .iter()
            .map(|s| s.version)
            .collect();
        assert_eq!(versions, vec![3, 4, 5]);
        assert_eq!(
            lens.status().unwrap(),
            UpgradeStatus::UpgradeAvailable {
                from: 2,
                to: 5,
                pending: 3,
                mandatory: true
            }
        );

        let report = lens.apply(&UpgradeApplyArgs::all()).unwrap();
        assert_eq!(report.applied_count(), 3);
        assert_eq!(db.version().unwrap(), 5);
    }

    #[test]
    fn test_recursive_create_from_scratch() {
        let dir = TempDir::new().unwrap();
        setup_scripts(dir.path());
        let db = UpgradeDatabase::open(dir.path().join("Test1.db")).unwrap();
        let catalog = catalog(dir.path(), &db, true);

        UpgradeLens::new(&db, &catalog)
            .apply(&UpgradeApplyArgs::all())
            .unwrap();
        assert_eq!(db.version().unwrap(), 5);
    }

    #[test]
    fn test_apply_one_at_a_time() {
        let dir = TempDir::new().unwrap();
        setup_scripts(dir.path());
        let db = UpgradeDatabase::open(dir.path().join("Test1.db")).unwrap();
        let catalog = catalog(dir.path(), &db, true);
        let lens = UpgradeLens::new(&db, &catalog);

        for expected in 1..=5 {
            let report = lens.apply(&UpgradeApplyArgs::one()).unwrap();
            assert_eq!(report.applied_count(), 1);
            assert_eq!(report.applied[0].version, expected);
            assert_eq!(db.version().unwrap(), expected);
        }
        assert!(lens.apply(&UpgradeApplyArgs::one()).unwrap().is_noop());
    }

    #[test]
    fn test_version_corrected_when_script_forgets_pragma() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1_full_SchemaTest_create.sql"), FULL_V1).unwrap();
        fs::write(
            dir.path().join("7_upgrade_SchemaTest_no pragma.sql"),
            "ALTER TABLE item ADD COLUMN price REAL;",
        )
        .unwrap();
        let db = UpgradeDatabase::open(dir.path().join("Test1.db")).unwrap();
        let catalog = catalog(dir.path(), &db, false);
        let (callback, events) = collector();
        let lens = UpgradeLens::new(&db, &catalog).with_callback(callback);

        let report = lens.apply(&UpgradeApplyArgs::all()).unwrap();

        assert_eq!(db.version().unwrap(), 7);
        assert_eq!(report.corrected_count(), 1);
        assert!(!report.applied[0].corrected);
        assert!(report.applied[1].corrected);

        let events = events.lock().unwrap();
        let warnings: Vec<_> = events.iter().filter(|e| e.is_warning()).collect();
        assert_eq!(
            warnings,
            vec![&UpgradeEvent::VersionCorrected {
                version: 7,
                file_name: "7_upgrade_SchemaTest_no pragma.sql".to_string(),
                found: 1,
            }]
        );
        assert!(matches!(
            events.last(),
            Some(UpgradeEvent::Completed {
                applied: 2,
                to_version: 7
            })
        ));
    }

    #[test]
    fn test_script_advancing_further_skips_covered_scripts() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("1_full_SchemaTest_create.sql"),
            "CREATE TABLE item (id INTEGER PRIMARY KEY); PRAGMA user_version = 3;",
        )
        .unwrap();
        fs::write(
            dir.path().join("2_upgrade_SchemaTest_dup.sql"),
            "CREATE TABLE item (id INTEGER PRIMARY KEY); PRAGMA user_version = 2;",
        )
        .unwrap();
        fs::write(
            dir.path().join("4_upgrade_SchemaTest_next.sql"),
            "CREATE TABLE other (id INTEGER); PRAGMA user_version = 4;",
        )
        .unwrap();
        let db = UpgradeDatabase::open(dir.path().join("Test1.db")).unwrap();
        let catalog = catalog(dir.path(), &db, false);
        let (callback, events) = collector();
        let lens = UpgradeLens::new(&db, &catalog).with_callback(callback);

        let report = lens.apply(&UpgradeApplyArgs::all()).unwrap();

        let applied: Vec<u32> = report.applied.iter().map(|s| s.version).collect();
        assert_eq!(applied, vec![1, 4]);
        assert_eq!(db.version().unwrap(), 4);
        assert!(events.lock().unwrap().iter().any(|e| matches!(
            e,
            UpgradeEvent::ScriptSkipped {
                version: 2,
                database_version: 3,
                ..
            }
        )));
    }

    #[test]
    fn test_failing_script_stops_and_keeps_progress() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1_full_SchemaTest_create.sql"), FULL_V1).unwrap();
        fs::write(
            dir.path().join("2_upgrade_SchemaTest_broken.sql"),
            "ALTER TABLE missing ADD COLUMN x INTEGER; PRAGMA user_version = 2;",
        )
        .unwrap();
        fs::write(
            dir.path().join("3_upgrade_SchemaTest_later.sql"),
            "CREATE TABLE later (id INTEGER); PRAGMA user_version = 3;",
        )
        .unwrap();
        let db = UpgradeDatabase::open(dir.path().join("Test1.db")).unwrap();
        let catalog = catalog(dir.path(), &db, false);
        let lens = UpgradeLens::new(&db, &catalog);

        let result = lens.apply(&UpgradeApplyArgs::all());
        assert!(matches!(
            result,
            Err(UpgradeError::ScriptExecution { version: 2, .. })
        ));
        assert_eq!(db.version().unwrap(), 1);
        assert!(!db.table_exists("later").unwrap());

        // Fix the script and retry; version 1 is not executed again
        fs::write(
            dir.path().join("2_upgrade_SchemaTest_broken.sql"),
            "ALTER TABLE item ADD COLUMN x INTEGER; PRAGMA user_version = 2;",
        )
        .unwrap();
        let report = lens.apply(&UpgradeApplyArgs::all()).unwrap();
        let applied: Vec<u32> = report.applied.iter().map(|s| s.version).collect();
        assert_eq!(applied, vec![2, 3]);
        assert_eq!(db.version().unwrap(), 3);
    }

    #[test]
    fn test_missing_script_file_at_apply_time() {
        let dir = TempDir::new().unwrap();
        setup_scripts(dir.path());
        let db = UpgradeDatabase::open(dir.path().join("Test1.db")).unwrap();
        let catalog = catalog(dir.path(), &db, false);

        fs::remove_file(dir.path().join("2_upgrade_SchemaTest_price.sql")).unwrap();

        let result = UpgradeLens::new(&db, &catalog).apply(&UpgradeApplyArgs::all());
        assert!(matches!(result, Err(UpgradeError::ScriptRead { .. })));
        assert_eq!(db.version().unwrap(), 1);
    }

    #[test]
    fn test_transactional_failure_rolls_back_script() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1_full_SchemaTest_create.sql"), FULL_V1).unwrap();
        fs::write(
            dir.path().join("2_upgrade_SchemaTest_half.sql"),
            "CREATE TABLE half (id INTEGER);
             PRAGMA user_version = 2;
             INSERT INTO nowhere VALUES (1);",
        )
        .unwrap();
        let db = UpgradeDatabase::open(dir.path().join("Test1.db")).unwrap();
        let catalog = catalog(dir.path(), &db, false);
        let lens = UpgradeLens::new(&db, &catalog);

        let result = lens.apply(&UpgradeApplyArgs::all().transactional(true));
        assert!(matches!(
            result,
            Err(UpgradeError::ScriptExecution { version: 2, .. })
        ));
        assert_eq!(db.version().unwrap(), 1);
        assert!(db.table_exists("item").unwrap());
        assert!(!db.table_exists("half").unwrap());
    }

    #[test]
    fn test_transactional_success() {
        let dir = TempDir::new().unwrap();
        setup_scripts(dir.path());
        let db = UpgradeDatabase::open(dir.path().join("Test1.db")).unwrap();
        let catalog = catalog(dir.path(), &db, true);

        let report = UpgradeLens::new(&db, &catalog)
            .apply(&UpgradeApplyArgs::all().transactional(true))
            .unwrap();
        assert_eq!(report.applied_count(), 5);
        assert_eq!(db.version().unwrap(), 5);
        assert_eq!(report.applied[3].category, ScriptCategory::Mandatory);
    }

    #[test]
    fn test_database_ahead_of_catalog() {
        let dir = TempDir::new().unwrap();
        setup_scripts(dir.path());
        let db = UpgradeDatabase::open(dir.path().join("Test1.db")).unwrap();
        db.set_version(9).unwrap();
        let catalog = catalog(dir.path(), &db, true);
        let lens = UpgradeLens::new(&db, &catalog);

        assert_eq!(
            lens.status().unwrap(),
            UpgradeStatus::Ahead {
                database_version: 9,
                latest_version: 5
            }
        );
        assert!(lens.apply(&UpgradeApplyArgs::all()).unwrap().is_noop());
        assert_eq!(db.version().unwrap(), 9);
    }
}
