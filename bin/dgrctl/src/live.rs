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
use clap::Args;
use dgr_common::config::AppConfig;
use dgr_engine::{live_fleet, model::CustomerRegistry, source::JsonDirectorySource, LiveSnapshot};
use indexmap::IndexMap;
use tokio::runtime::Runtime;
use tokio::signal;
use tracing::info;

#[derive(Debug, Args)]
pub struct LiveCommand {
    /// Directory holding `<collection>.jsonl` or `<collection>.json` exports.
    #[arg(long = "data-dir", value_name = "DIR", env = "DGR_DATA_DIR")]
    data_dir: PathBuf,

    /// Keep refreshing every `live.refresh_interval` until interrupted.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    watch: bool,
}

pub fn run(command: LiveCommand, config: &AppConfig) -> Result<ExitCode> {
    let registry = CustomerRegistry::from_config(config)?;
    let source = JsonDirectorySource::new(&command.data_dir);

    if !command.watch {
        render_fleet(&live_fleet(&registry, &source, 0));
        return Ok(ExitCode::SUCCESS);
    }

    let period = config.live.refresh_interval;
    let runtime = Runtime::new()?;
    runtime.block_on(async {
        let mut ticker = tokio::time::interval(period);
        let mut cycle: u64 = 0;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    render_fleet(&live_fleet(&registry, &source, cycle));
                    cycle += 1;
                }
                _ = signal::ctrl_c() => {
                    info!(cycles = cycle, "live view interrupted");
                    break;
                }
            }
        }
    });
    Ok(ExitCode::SUCCESS)
}

fn render_fleet(results: &IndexMap<String, dgr_engine::Result<LiveSnapshot>>) {
    println!(
        "{:<12} {:<18} {:>18} {:>10} {:>12}",
        "Customer", "Last Record", "Generation (kWh)", "PLF %", "Irradiation"
    );
    for (customer, result) in results {
        match result {
            Ok(snapshot) if snapshot.status.is_no_data() => {
                println!("{customer:<12} no data");
            }
            Ok(snapshot) => {
                let as_of = snapshot
                    .as_of
                    .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                let irradiation = snapshot
                    .irradiation
                    .map(|value| format!("{value:.2}"))
                    .unwrap_or_else(|| "-".to_owned());
                println!(
                    "{:<12} {:<18} {:>18.2} {:>10.2} {:>12}",
                    customer,
                    as_of,
                    snapshot.total_generation,
                    snapshot.plf_percent(),
                    irradiation
                );
            }
            Err(err) => println!("{customer:<12} error: {err}"),
        }
    }
    println!();
}
