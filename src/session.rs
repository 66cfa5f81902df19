//! Upgrade session
//!
//! `SchemaUpgrade` bundles one database handle with the catalog found by the
//! last successful script search. It is the simplest way to drive a complete
//! create-or-upgrade cycle:
//!
//! ```rust,ignore
//! use sqlite_upgrade::{CatalogSearchArgs, SchemaUpgrade, UpgradeApplyArgs};
//!
//! let mut session = SchemaUpgrade::open("data/app.db")?;
//! session.search_scripts(&CatalogSearchArgs::new("app", "sql"))?;
//! if session.is_upgrade_available()? {
//!     session.apply(&UpgradeApplyArgs::all())?;
//! }
//! ```

use std::path::Path;

use crate::database::UpgradeDatabase;
use crate::error::{Result, UpgradeError};
use crate::lens::catalog::{CatalogSearchArgs, ScriptCatalog, ScriptDescriptor};
use crate::lens::upgrade::{
    ApplyReport, UpgradeApplyArgs, UpgradeEventCallback, UpgradeLens, UpgradeStatus,
};

/// A database together with its current script catalog
pub struct SchemaUpgrade {
    db: UpgradeDatabase,
    catalog: Option<ScriptCatalog>,
    callback: Option<UpgradeEventCallback>,
}

impl SchemaUpgrade {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(UpgradeDatabase::open(path)?))
    }

    pub fn new(db: UpgradeDatabase) -> Self {
        Self {
            db,
            catalog: None,
            callback: None,
        }
    }

    /// Receive upgrade events from every apply call
    pub fn with_callback(mut self, callback: UpgradeEventCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn database(&self) -> &UpgradeDatabase {
        &self.db
    }

    /// Catalog of the last successful search
    pub fn catalog(&self) -> Option<&ScriptCatalog> {
        self.catalog.as_ref()
    }

    /// Version of the last executed SQL script
    pub fn version(&self) -> Result<u32> {
        self.db.version()
    }

    /// Search scripts and replace the current catalog
    ///
    /// On error the previous catalog is kept.
    pub fn search_scripts(&mut self, args: &CatalogSearchArgs) -> Result<&ScriptCatalog> {
        let catalog = ScriptCatalog::build(args, &self.db)?;
        Ok(self.catalog.insert(catalog))
    }

    /// Lens over the current catalog
    pub fn lens(&self) -> Result<UpgradeLens<'_>> {
        let catalog = self.catalog.as_ref().ok_or(UpgradeError::CatalogNotBuilt)?;
        let lens = UpgradeLens::new(&self.db, catalog);
        Ok(match &self.callback {
            Some(cb) => lens.with_callback(cb.clone()),
            None => lens,
        })
    }

    pub fn pending_scripts(&self) -> Result<Vec<&ScriptDescriptor>> {
        self.lens()?.pending_scripts()
    }

    pub fn is_upgrade_available(&self) -> Result<bool> {
        self.lens()?.has_pending()
    }

    pub fn is_upgrade_mandatory(&self) -> Result<bool> {
        self.lens()?.has_mandatory_pending()
    }

    pub fn status(&self) -> Result<UpgradeStatus> {
        self.lens()?.status()
    }

    /// Apply pending scripts of the current catalog
    pub fn apply(&self, args: &UpgradeApplyArgs) -> Result<ApplyReport> {
        self.lens()?.apply(args)
    }

    /// Close the database
    pub fn close(self) -> Result<()> {
        self.db.close()
    }
}
