use anyhow::{anyhow, Result};
use config::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::lens::catalog::{CatalogSearchArgs, DEFAULT_SCRIPT_PATTERN};

/// Settings for locating a database and its scripts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// Path to the SQLite database to create or upgrade
    #[serde(default)]
    pub database: Option<String>,

    /// Directory holding the SQL scripts
    #[serde(default)]
    pub scripts_dir: Option<String>,

    /// Schema name substituted for `{schema_name}` in the pattern
    #[serde(default)]
    pub schema_name: Option<String>,

    /// Search subdirectories of `scripts_dir` too
    #[serde(default)]
    pub recursive: bool,

    /// Script file name pattern
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Wrap each script and its version update in a transaction
    #[serde(default)]
    pub transactional: bool,
}

fn default_pattern() -> String {
    DEFAULT_SCRIPT_PATTERN.to_string()
}

const EMPTY_CONFIG: &str = r#"### sqlite-upgrade configuration file

### database to create or upgrade
# database = "data/app.db"

### where the SQL scripts live, and the schema name used in their file names
# scripts_dir = "sql"
# schema_name = "app"

### also search subdirectories of scripts_dir
# recursive = false

### script file name pattern, placeholders: {schema_name}, {db_name}, {db_ext}
# pattern = '^(\d+)_(full|upgrade|mandatory)_{schema_name}_(.*)\.sql$'

### run each script inside a transaction
# transactional = false
"#;

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            database: None,
            scripts_dir: None,
            schema_name: None,
            recursive: false,
            pattern: default_pattern(),
            transactional: false,
        }
    }
}

impl UpgradeConfig {
    /// Load configuration from a TOML file and `SQLITE_UPGRADE_*` variables
    ///
    /// An explicit `path` must exist. Without one, the default config file is
    /// read when present.
    pub fn new(path: &Option<String>) -> Result<UpgradeConfig> {
        let mut builder = Config::builder();

        match path {
            Some(p) => {
                if !Path::new(p).exists() {
                    return Err(anyhow!("Config file '{}' does not exist", p));
                }
                builder = builder.add_source(config::File::from(Path::new(p)));
            }
            None => {
                if let Some(p) = Self::config_file_path() {
                    if p.exists() {
                        builder = builder.add_source(config::File::from(p.as_path()));
                    }
                }
            }
        }

        // E.g., `SQLITE_UPGRADE_SCHEMA_NAME=app sqlite-upgrade status`
        builder = builder.add_source(config::Environment::with_prefix("SQLITE_UPGRADE"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        settings
            .try_deserialize::<UpgradeConfig>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))
    }

    /// Default config file: `$HOME/.sqlite-upgrade/config.toml`
    pub fn config_file_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".sqlite-upgrade").join("config.toml"))
    }

    /// Write a commented template to `path`, refusing to overwrite
    pub fn write_template(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(anyhow!("'{}' already exists", path.display()));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow!("Unable to create config directory: {}", e))?;
        }
        std::fs::write(path, EMPTY_CONFIG)
            .map_err(|e| anyhow!("Unable to create config file {}: {}", path.display(), e))
    }

    /// Script search arguments from the configured values
    pub fn search_args(&self) -> Result<CatalogSearchArgs> {
        let schema_name = self
            .schema_name
            .clone()
            .ok_or_else(|| anyhow!("No schema name configured (use --schema-name)"))?;
        let scripts_dir = self
            .scripts_dir
            .clone()
            .ok_or_else(|| anyhow!("No scripts directory configured (use --scripts)"))?;

        Ok(CatalogSearchArgs::new(schema_name, scripts_dir)
            .recursive(self.recursive)
            .with_pattern(self.pattern.clone()))
    }

    /// Configured database path
    pub fn database_path(&self) -> Result<PathBuf> {
        self.database
            .as_ref()
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("No database configured (use --database)"))
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let unset = || "(not set)".to_string();
        [
            format!(
                "Database:       {}",
                self.database.clone().unwrap_or_else(unset)
            ),
            format!(
                "Scripts Dir:    {}",
                self.scripts_dir.clone().unwrap_or_else(unset)
            ),
            format!(
                "Schema Name:    {}",
                self.schema_name.clone().unwrap_or_else(unset)
            ),
            format!("Recursive:      {}", self.recursive),
            format!("Pattern:        {}", self.pattern),
            format!("Transactional:  {}", self.transactional),
        ]
        .join("\n")
    }
}
