use anyhow::Result;
use clap::Args;
use sqlite_upgrade::lens::upgrade::AppliedScript;
use sqlite_upgrade::lens::utils::OutputFormat;
use sqlite_upgrade::{UpgradeApplyArgs, UpgradeConfig, UpgradeEvent, UpgradeEventCallback};
use std::sync::Arc;
use tabled::settings::Style;
use tabled::Table;

use super::{open_session, print_json};

/// Arguments for the Apply command
#[derive(Args)]
pub struct ApplyArgs {
    #[clap(flatten)]
    pub upgrade: UpgradeApplyArgs,

    /// Do not print per-script progress
    #[clap(short, long)]
    pub quiet: bool,
}

pub fn run(config: &UpgradeConfig, args: ApplyArgs, output_format: OutputFormat) -> Result<()> {
    let ApplyArgs { upgrade, quiet } = args;
    let transactional = upgrade.transactional || config.transactional;
    let upgrade = upgrade.transactional(transactional);

    let mut session = open_session(config)?;
    if !quiet && !output_format.is_json() {
        let callback: UpgradeEventCallback = Arc::new(|event: UpgradeEvent| match event {
            UpgradeEvent::ScriptStarted { version, file_name } => {
                eprintln!("applying v{}: {}", version, file_name);
            }
            UpgradeEvent::ScriptSkipped {
                version,
                file_name,
                database_version,
            } => {
                eprintln!(
                    "skipping v{}: {} (database already at v{})",
                    version, file_name, database_version
                );
            }
            _ => {}
        });
        session = session.with_callback(callback);
    }

    let report = session.apply(&upgrade)?;

    match output_format {
        OutputFormat::Json | OutputFormat::JsonPretty => print_json(&report, output_format)?,
        OutputFormat::Psv => {
            println!("version|category|file_name|corrected|applied_at");
            for s in &report.applied {
                println!(
                    "{}|{}|{}|{}|{}",
                    s.version,
                    s.category,
                    s.file_name,
                    s.corrected,
                    s.applied_at.to_rfc3339()
                );
            }
        }
        _ => {
            if report.is_noop() {
                println!("Nothing to apply, database is at v{}", report.to_version);
            } else {
                let rows: Vec<AppliedScript> = report.applied.clone();
                let mut table = Table::new(rows);
                if output_format == OutputFormat::Markdown {
                    table.with(Style::markdown());
                } else {
                    table.with(Style::rounded());
                }
                println!("{}", table);
                println!(
                    "Upgraded v{} -> v{} ({} applied, {} corrected)",
                    report.from_version,
                    report.to_version,
                    report.applied_count(),
                    report.corrected_count()
                );
            }
        }
    }

    session.close()?;
    Ok(())
}
