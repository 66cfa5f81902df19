//! Script catalog lens
//!
//! This module discovers migration scripts on disk and validates them as a
//! whole. A catalog is only produced when the complete set is consistent:
//!
//! - versions are unique
//! - every category is `full`, `upgrade` or `mandatory`
//! - at least one script matched the pattern
//! - the lowest version is the one and only `full` script
//!
//! Versions do not need to be contiguous; gaps are allowed.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlite_upgrade::database::UpgradeDatabase;
//! use sqlite_upgrade::lens::catalog::{CatalogSearchArgs, ScriptCatalog};
//!
//! let db = UpgradeDatabase::open("data/app.db")?;
//! let args = CatalogSearchArgs::new("app", "sql").recursive(true);
//! let catalog = ScriptCatalog::build(&args, &db)?;
//!
//! for script in catalog.iter() {
//!     println!("{} {} {}", script.version, script.category, script.description);
//! }
//! ```

pub mod args;
pub mod pattern;
pub mod scan;
pub mod types;

pub use args::CatalogSearchArgs;
pub use pattern::{NameMatch, NamingPattern, PatternContext, DEFAULT_SCRIPT_PATTERN};
pub use types::{ScriptCategory, ScriptDescriptor, ScriptSummary};

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::database::UpgradeDatabase;
use crate::error::{Result, UpgradeError};

/// Highest version storable in SQLite's signed 32-bit `user_version`
pub const MAX_SCRIPT_VERSION: u32 = i32::MAX as u32;

/// Validated, version-ordered set of scripts for one schema
#[derive(Debug, Clone, Serialize)]
pub struct ScriptCatalog {
    schema_name: String,
    template: String,
    pattern: String,
    search_path: PathBuf,
    recursive: bool,
    scripts: Vec<ScriptDescriptor>,
}

/// A matching file before set-level validation
struct RawScript {
    version: u32,
    file_name: String,
    category: String,
    description: String,
    path: PathBuf,
}

impl ScriptCatalog {
    /// Search scripts for the given database
    ///
    /// `{db_name}` and `{db_ext}` are bound to the database file name.
    pub fn build(args: &CatalogSearchArgs, db: &UpgradeDatabase) -> Result<Self> {
        let context =
            PatternContext::new(&args.schema_name).with_database(db.name(), db.extension());
        Self::build_with(args, &context)
    }

    /// Search scripts with an explicit placeholder context
    ///
    /// The schema name of `args` takes precedence over the one in `context`.
    pub fn build_with(args: &CatalogSearchArgs, context: &PatternContext) -> Result<Self> {
        if args.schema_name.is_empty() {
            return Err(UpgradeError::InvalidSchemaName);
        }

        let search_path = absolute_dir(&args.search_path)?;

        let context = PatternContext {
            schema_name: args.schema_name.clone(),
            ..context.clone()
        };
        let pattern = NamingPattern::compile(&args.pattern, &context)?;

        let mut raw = Vec::new();
        for file in scan::list_files(&search_path, args.recursive)? {
            let Some(m) = pattern.match_name(&file.file_name) else {
                continue;
            };
            let version = parse_version(&file.file_name, m.version)?;
            raw.push(RawScript {
                version,
                category: m.category.to_string(),
                description: m.description.to_string(),
                file_name: file.file_name.clone(),
                path: file.path,
            });
        }

        // Enforce global sorting of all versions
        raw.sort_by(|a, b| {
            a.version
                .cmp(&b.version)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });

        let scripts = validate(raw, &pattern, &search_path)?;

        debug!(
            schema = %args.schema_name,
            path = %search_path.display(),
            recursive = args.recursive,
            count = scripts.len(),
            "script catalog built"
        );

        Ok(Self {
            schema_name: args.schema_name.clone(),
            template: args.pattern.clone(),
            pattern: pattern.as_str().to_string(),
            search_path,
            recursive: args.recursive,
            scripts,
        })
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// Pattern template as given, before substitution
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Compiled pattern after placeholder substitution
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn search_path(&self) -> &Path {
        &self.search_path
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// All scripts, ascending by version
    pub fn scripts(&self) -> &[ScriptDescriptor] {
        &self.scripts
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScriptDescriptor> {
        self.scripts.iter()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Always false for a built catalog
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Look up a script by version
    pub fn get(&self, version: u32) -> Option<&ScriptDescriptor> {
        self.scripts
            .binary_search_by_key(&version, |s| s.version)
            .ok()
            .map(|i| &self.scripts[i])
    }

    /// The baseline script
    pub fn full_script(&self) -> Option<&ScriptDescriptor> {
        self.scripts.first()
    }

    /// Highest script version in the catalog
    pub fn latest_version(&self) -> u32 {
        self.scripts.last().map(|s| s.version).unwrap_or(0)
    }

    /// Scripts newer than `version`, ascending
    pub fn newer_than(&self, version: u32) -> impl Iterator<Item = &ScriptDescriptor> {
        self.scripts.iter().filter(move |s| s.version > version)
    }
}

impl<'a> IntoIterator for &'a ScriptCatalog {
    type Item = &'a ScriptDescriptor;
    type IntoIter = std::slice::Iter<'a, ScriptDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.scripts.iter()
    }
}

fn absolute_dir(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|_| UpgradeError::NotADirectory {
        path: path.to_path_buf(),
    })?;
    if !absolute.is_dir() {
        return Err(UpgradeError::NotADirectory { path: absolute });
    }
    Ok(absolute)
}

fn parse_version(file_name: &str, value: &str) -> Result<u32> {
    value
        .parse::<u32>()
        .ok()
        .filter(|v| *v <= MAX_SCRIPT_VERSION)
        .ok_or_else(|| UpgradeError::InvalidVersion {
            file_name: file_name.to_string(),
            value: value.to_string(),
        })
}

/// Check set-level invariants on version-sorted scripts
fn validate(
    raw: Vec<RawScript>,
    pattern: &NamingPattern,
    search_path: &Path,
) -> Result<Vec<ScriptDescriptor>> {
    // Check version number uniqueness
    if let Some(pair) = raw.windows(2).find(|w| w[0].version == w[1].version) {
        return Err(UpgradeError::DuplicateVersion {
            version: pair[0].version,
            first: pair[0].path.clone(),
            second: pair[1].path.clone(),
        });
    }

    // Check script categories
    let mut scripts = Vec::with_capacity(raw.len());
    for r in raw {
        let category =
            ScriptCategory::from_str(&r.category).map_err(|_| UpgradeError::InvalidCategory {
                file_name: r.file_name.clone(),
                category: r.category.clone(),
            })?;
        scripts.push(ScriptDescriptor {
            version: r.version,
            file_name: r.file_name,
            category,
            description: r.description,
            path: r.path,
        });
    }

    let Some(first) = scripts.first() else {
        return Err(UpgradeError::NoScriptsFound {
            pattern: pattern.as_str().to_string(),
            path: search_path.to_path_buf(),
        });
    };

    // The full script comes first
    if !first.is_full() {
        return Err(UpgradeError::MissingFullSchema {
            file_name: first.file_name.clone(),
            category: first.category.to_string(),
        });
    }

    // And there is only one
    if let Some(second) = scripts.iter().skip(1).find(|s| s.is_full()) {
        return Err(UpgradeError::MultipleFullSchemas {
            first: first.file_name.clone(),
            second: second.file_name.clone(),
        });
    }

    Ok(scripts)
}
