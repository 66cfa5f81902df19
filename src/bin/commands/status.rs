use anyhow::Result;
use clap::Args;
use serde::Serialize;
use sqlite_upgrade::lens::utils::OutputFormat;
use sqlite_upgrade::{UpgradeConfig, UpgradeDatabase, UpgradeStatus};

use super::{open_session, print_json};

/// Exit code of `status --check` when a mandatory upgrade is pending
const EXIT_MANDATORY_PENDING: i32 = 2;

/// Arguments for the Status command
#[derive(Args)]
pub struct StatusArgs {
    /// Exit with code 2 when a mandatory upgrade is pending
    #[clap(long)]
    pub check: bool,
}

#[derive(Debug, Serialize)]
struct StatusInfo {
    database: String,
    database_version: u32,
    schema_name: String,
    scripts_dir: String,
    scripts: usize,
    latest_version: u32,
    pending: usize,
    mandatory: bool,
    status: UpgradeStatus,
}

#[derive(Debug, Serialize)]
struct VersionInfo {
    database: String,
    version: i64,
}

pub fn run(config: &UpgradeConfig, args: StatusArgs, output_format: OutputFormat) -> Result<()> {
    let session = open_session(config)?;
    let lens = session.lens()?;
    let catalog = lens.catalog();

    let status = lens.status()?;
    let info = StatusInfo {
        database: session.database().full_path().to_string_lossy().to_string(),
        database_version: lens.current_version()?,
        schema_name: catalog.schema_name().to_string(),
        scripts_dir: catalog.search_path().to_string_lossy().to_string(),
        scripts: catalog.len(),
        latest_version: catalog.latest_version(),
        pending: lens.pending_scripts()?.len(),
        mandatory: status.is_mandatory(),
        status,
    };

    match output_format {
        OutputFormat::Json | OutputFormat::JsonPretty => print_json(&info, output_format)?,
        OutputFormat::Psv => {
            println!("database|database_version|latest_version|pending|mandatory");
            println!(
                "{}|{}|{}|{}|{}",
                info.database, info.database_version, info.latest_version, info.pending, info.mandatory
            );
        }
        _ => {
            println!("Database:       {}", info.database);
            println!("Version:        {}", info.database_version);
            println!("Schema Name:    {}", info.schema_name);
            println!("Scripts Dir:    {}", info.scripts_dir);
            println!(
                "Scripts:        {} (latest v{})",
                info.scripts, info.latest_version
            );
            println!("Status:         {}", info.status);
        }
    }

    if args.check && info.mandatory {
        drop(session);
        std::process::exit(EXIT_MANDATORY_PENDING);
    }
    Ok(())
}

/// Print the stored database version without searching scripts
pub fn run_version(config: &UpgradeConfig, output_format: OutputFormat) -> Result<()> {
    let db = UpgradeDatabase::open(config.database_path()?)?;
    let version = db.raw_version()?;

    if output_format.is_json() {
        let info = VersionInfo {
            database: db.full_path().to_string_lossy().to_string(),
            version,
        };
        return print_json(&info, output_format);
    }
    println!("{}", version);
    Ok(())
}
