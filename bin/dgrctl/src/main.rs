//! ---
//! dgr_section: "05-networking-external-interfaces"
//! dgr_subsection: "binary"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Control CLI for operators generating plant reports."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use dgr_common::config::{AppConfig, LoadedAppConfig};
use dgr_common::logging::init_tracing;
use tracing::{info, warn};

mod live;
mod report;

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "Daily generation report (DGR) utility for solar plant fleets",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", global = true, help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(
        short = 'V',
        long = "version",
        action = ArgAction::SetTrue,
        help = "Print version information and exit"
    )]
    version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Generate the daily/month-to-date report for one plant")]
    Report(report::ReportCommand),
    #[command(about = "Show the latest record of every configured plant")]
    Live(live::LiveCommand),
    #[command(about = "List configured customer profiles")]
    Customers,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    if cli.version {
        println!("dgrctl {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        eprintln!("no command given; see `dgrctl --help`");
        return Ok(ExitCode::from(2));
    };

    let loaded = load_config(cli.config)?;
    if let Err(err) = init_tracing("dgrctl", &loaded.config.logging) {
        dgr_logging::init();
        warn!(error = %err, "file logging unavailable; logging to stdout only");
    }
    match &loaded.source {
        Some(path) => info!(config = %path.display(), "configuration loaded"),
        None => info!("using embedded fleet configuration"),
    }

    match command {
        Commands::Report(cmd) => report::run(cmd, &loaded.config),
        Commands::Live(cmd) => live::run(cmd, &loaded.config),
        Commands::Customers => {
            list_customers(&loaded.config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `--config` wins over `DGR_CONFIG`, which wins over the default search.
fn load_config(explicit: Option<PathBuf>) -> Result<LoadedAppConfig> {
    match explicit {
        Some(path) => AppConfig::load_file(path),
        None => AppConfig::load_with_source(&[PathBuf::from("configs/dgr.toml")]),
    }
}

fn list_customers(config: &AppConfig) {
    println!(
        "{:<12} {:<14} {:>10} {:>10}",
        "Customer", "Collection", "Base", "Inverters"
    );
    for (id, customer) in &config.customers {
        println!(
            "{:<12} {:<14} {:>10.2} {:>10}",
            id, customer.collection, customer.rated_capacity_base, customer.inverter_count
        );
    }
}
