//! ---
//! dgr_section: "08-generation-reporting"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Normalisation and aggregation routines for generation reporting."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::{errors::Result, DgrReport};

pub const TABLE_HEADER: [&str; 3] = [
    "Inverter",
    "Daily Generation (kWh)",
    "Monthly Generation (kWh)",
];

/// Paths written by one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub table: PathBuf,
    pub summary: PathBuf,
    pub json: PathBuf,
}

#[derive(Debug)]
pub struct ReportExporter<'a> {
    report: &'a DgrReport,
}

impl<'a> ReportExporter<'a> {
    pub fn new(report: &'a DgrReport) -> Self {
        Self { report }
    }

    /// Stem shared by every file of this report, e.g. `Kasturi_DGR_Report_2025-11-14`.
    pub fn file_stem(&self, kind: &str) -> String {
        format!(
            "{}_DGR_{}_{}",
            self.report.customer,
            kind,
            self.report.data_day.format("%Y-%m-%d")
        )
    }

    pub fn export_all(&self, output_dir: &Path) -> Result<ExportedFiles> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let files = ExportedFiles {
            table: output_dir.join(format!("{}.csv", self.file_stem("Report"))),
            summary: output_dir.join(format!("{}.csv", self.file_stem("Summary"))),
            json: output_dir.join(format!("{}.json", self.file_stem("Report"))),
        };

        self.write_table(&files.table)?;
        self.write_summary(&files.summary)?;

        let generated_at = self.report.generated_at.to_rfc3339();
        let envelope = ReportEnvelope {
            generated_at: &generated_at,
            schema: dgr_report_schema(),
            data: self.report,
        };
        write_json(&files.json, &envelope)?;

        info!(
            customer = %self.report.customer,
            "Reports exported to {}",
            output_dir.display()
        );
        Ok(files)
    }

    fn write_table(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(TABLE_HEADER)?;
        for row in &self.report.rows {
            writer.write_record([
                row.label.clone(),
                format!("{:.2}", row.daily),
                format!("{:.2}", row.monthly),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_summary(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.serialize(self.report.summary())?;
        writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ReportEnvelope<'a, T: Serialize> {
    generated_at: &'a str,
    schema: serde_json::Value,
    data: &'a T,
}

fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized)?;
    Ok(())
}

fn dgr_report_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "DailyGenerationReport",
        "type": "object",
        "properties": {
            "customer": {"type": "string"},
            "report_date": {"type": "string", "format": "date"},
            "data_day": {"type": "string", "format": "date"},
            "status": {"type": "string", "enum": ["available", "no-data"]},
            "rows": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "label": {"type": "string"},
                        "column": {"type": "string"},
                        "daily": {"type": "number"},
                        "monthly": {"type": "number"}
                    },
                    "required": ["label", "daily", "monthly"]
                }
            },
            "daily_irradiation": {"type": ["number", "null"]},
            "monthly_irradiation": {"type": ["number", "null"]},
            "kpis": {
                "type": "object",
                "properties": {
                    "total_daily_generation": {"type": "number"},
                    "total_monthly_generation": {"type": "number"},
                    "plf": {"type": "number"}
                },
                "required": ["total_daily_generation", "total_monthly_generation", "plf"]
            }
        },
        "required": ["customer", "report_date", "data_day", "status", "rows", "kpis"]
    })
}
