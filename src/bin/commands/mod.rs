pub mod apply;
pub mod config;
pub mod list;
pub mod status;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sqlite_upgrade::lens::utils::OutputFormat;
use sqlite_upgrade::{SchemaUpgrade, UpgradeConfig};

/// Database and script options, overriding configured values
#[derive(Args, Debug, Default)]
pub struct ScriptArgs {
    /// SQLite database to create or upgrade
    #[clap(short, long, global = true)]
    pub database: Option<String>,

    /// Directory holding the SQL scripts
    #[clap(short = 'p', long = "scripts", global = true)]
    pub scripts_dir: Option<String>,

    /// Schema name used in script file names
    #[clap(short, long, global = true)]
    pub schema_name: Option<String>,

    /// Also search subdirectories of the scripts directory
    #[clap(short, long, global = true)]
    pub recursive: bool,

    /// Script file name pattern ({schema_name}, {db_name} and {db_ext} are substituted)
    #[clap(long, global = true)]
    pub pattern: Option<String>,
}

impl ScriptArgs {
    pub fn apply_to(&self, config: &mut UpgradeConfig) {
        if let Some(d) = &self.database {
            config.database = Some(d.clone());
        }
        if let Some(p) = &self.scripts_dir {
            config.scripts_dir = Some(p.clone());
        }
        if let Some(s) = &self.schema_name {
            config.schema_name = Some(s.clone());
        }
        if self.recursive {
            config.recursive = true;
        }
        if let Some(p) = &self.pattern {
            config.pattern = p.clone();
        }
    }
}

/// Open the configured database and search its scripts
pub(crate) fn open_session(config: &UpgradeConfig) -> Result<SchemaUpgrade> {
    let mut session = SchemaUpgrade::open(config.database_path()?)?;
    session.search_scripts(&config.search_args()?)?;
    Ok(session)
}

pub(crate) fn print_json<T: Serialize>(value: &T, output_format: OutputFormat) -> Result<()> {
    println!("{}", output_format.to_json(value)?);
    Ok(())
}
