use clap::{Parser, Subcommand};
use sqlite_upgrade::lens::utils::OutputFormat;
use sqlite_upgrade::UpgradeConfig;
use tracing::Level;

mod commands;

use commands::apply::ApplyArgs;
use commands::config::ConfigArgs;
use commands::list::ListArgs;
use commands::status::StatusArgs;
use commands::ScriptArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.sqlite-upgrade/config.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long, global = true)]
    debug: bool,

    /// Output format: table, markdown, json, json-pretty, psv
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[clap(flatten)]
    scripts: ScriptArgs,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the database version and whether an upgrade is available
    Status(StatusArgs),

    /// List all scripts found for the schema
    List(ListArgs),

    /// List scripts newer than the database version
    Pending(ListArgs),

    /// Apply pending scripts
    Apply(ApplyArgs),

    /// Print the database version (PRAGMA user_version)
    Version,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let mut config = match UpgradeConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };
    cli.scripts.apply_to(&mut config);

    let format = cli.format;
    let result = match cli.command {
        Commands::Status(args) => commands::status::run(&config, args, format),
        Commands::List(args) => commands::list::run(&config, args, false, format),
        Commands::Pending(args) => commands::list::run(&config, args, true, format),
        Commands::Apply(args) => commands::apply::run(&config, args, format),
        Commands::Version => commands::status::run_version(&config, format),
        Commands::Config(args) => commands::config::run(&config, args, format),
    };

    if let Err(e) = result {
        eprintln!("ERROR: {:#}", e);
        std::process::exit(1);
    }
}
