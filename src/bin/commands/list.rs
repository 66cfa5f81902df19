use anyhow::Result;
use clap::Args;
use sqlite_upgrade::lens::catalog::ScriptSummary;
use sqlite_upgrade::lens::utils::{truncate_text, OutputFormat, DEFAULT_DESCRIPTION_MAX_LEN};
use sqlite_upgrade::UpgradeConfig;
use tabled::settings::Style;
use tabled::Table;

use super::{open_session, print_json};

/// Arguments for the List and Pending commands
#[derive(Args)]
pub struct ListArgs {
    /// Show full descriptions instead of truncating them
    #[clap(long)]
    pub full: bool,
}

pub fn run(
    config: &UpgradeConfig,
    args: ListArgs,
    pending_only: bool,
    output_format: OutputFormat,
) -> Result<()> {
    let session = open_session(config)?;

    let scripts = if pending_only {
        session.pending_scripts()?
    } else {
        session.lens()?.catalog().iter().collect()
    };

    let mut rows: Vec<ScriptSummary> = scripts.iter().map(|s| s.summary()).collect();

    if output_format.is_json() {
        return print_json(&rows, output_format);
    }

    if rows.is_empty() {
        if pending_only {
            eprintln!("No pending scripts (database version {})", session.version()?);
        }
        return Ok(());
    }

    if !args.full && output_format.is_table() {
        for row in rows.iter_mut() {
            row.description = truncate_text(&row.description, DEFAULT_DESCRIPTION_MAX_LEN);
        }
    }

    match output_format {
        OutputFormat::Markdown => println!("{}", Table::new(rows).with(Style::markdown())),
        OutputFormat::Psv => {
            println!("version|category|description|file_name");
            for row in &rows {
                println!(
                    "{}|{}|{}|{}",
                    row.version, row.category, row.description, row.file_name
                );
            }
        }
        _ => println!("{}", Table::new(rows).with(Style::rounded())),
    }
    Ok(())
}
