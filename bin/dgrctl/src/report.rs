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

use anyhow::{Context, Result};
use clap::Args;
use dgr_common::config::AppConfig;
use dgr_engine::{
    api::parse_report_date, generate_report, model::CustomerRegistry, source::JsonDirectorySource,
    DgrReport,
};
use dgr_logging::{dgr_error, dgr_info, LogContext};

#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Customer identifier as configured under `[customers.<ID>]`.
    #[arg(long, value_name = "ID")]
    customer: String,

    /// Report date (YYYY-MM-DD); the report covers the day before. Defaults to today.
    #[arg(long, value_name = "DATE")]
    date: Option<String>,

    /// Directory holding `<collection>.jsonl` or `<collection>.json` exports.
    #[arg(long = "data-dir", value_name = "DIR", env = "DGR_DATA_DIR")]
    data_dir: PathBuf,

    /// Where report files are written (defaults to `export.directory`).
    #[arg(long = "export-dir", value_name = "DIR")]
    export_dir: Option<PathBuf>,

    /// Print the report without writing export files.
    #[arg(long = "no-export", action = clap::ArgAction::SetTrue)]
    no_export: bool,
}

pub fn run(command: ReportCommand, config: &AppConfig) -> Result<ExitCode> {
    let registry = CustomerRegistry::from_config(config)?;
    let report_date = match &command.date {
        Some(raw) => parse_report_date(raw)?,
        None => config.today()?,
    };
    let source = JsonDirectorySource::new(&command.data_dir);

    let report_date_key = report_date.to_string();
    let ctx = LogContext::new()
        .with_customer(&command.customer)
        .with_report_date(&report_date_key);
    let report = match generate_report(&registry, &source, &command.customer, report_date) {
        Ok(report) => report,
        Err(err) => {
            dgr_error!(context = ctx, "report generation failed: {}", err);
            return Err(err).with_context(|| format!("report for {} failed", command.customer));
        }
    };

    if report.is_no_data() {
        eprintln!("No data found for this range.");
        return Ok(ExitCode::FAILURE);
    }

    render_report(&report);

    if !command.no_export {
        let output_dir = command
            .export_dir
            .unwrap_or_else(|| config.export.directory.clone());
        let files = report.exporter().export_all(&output_dir)?;
        dgr_info!(context = ctx, "exports written to {}", output_dir.display());
        println!();
        println!("Report written to {}", files.table.display());
        println!("Summary written to {}", files.summary.display());
        println!("JSON written to {}", files.json.display());
    }

    Ok(ExitCode::SUCCESS)
}

fn render_report(report: &DgrReport) {
    println!(
        "{} DGR for {} (report date {})",
        report.customer, report.data_day, report.report_date
    );
    println!();
    println!(
        "Total Daily Generation (kWh): {:.2}",
        report.kpis.total_daily_generation
    );
    println!("PLF % (Yesterday): {:.2}%", report.kpis.plf_percent());
    println!(
        "Total Monthly Generation (kWh): {:.2}",
        report.kpis.total_monthly_generation
    );
    if let (Some(daily), Some(monthly)) = (report.daily_irradiation, report.monthly_irradiation) {
        println!("Irradiation: {daily:.2} (day), {monthly:.2} (month mean)");
    }
    if report.discarded_records > 0 {
        println!(
            "Skipped {} records with unrecognised timestamps",
            report.discarded_records
        );
    }

    println!();
    println!(
        "{:<28} {:>24} {:>26}",
        "Inverter", "Daily Generation (kWh)", "Monthly Generation (kWh)"
    );
    for row in &report.rows {
        println!("{:<28} {:>24.2} {:>26.2}", row.label, row.daily, row.monthly);
    }
}
