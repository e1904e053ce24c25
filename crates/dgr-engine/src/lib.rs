//! ---
//! dgr_section: "08-generation-reporting"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Normalisation and aggregation routines for generation reporting."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
pub mod aggregate;
pub mod api;
pub mod errors;
pub mod io;
pub mod kpi;
pub mod live;
pub mod model;
pub mod normalize;
pub mod reports;
pub mod source;
pub mod telemetry;

use chrono::{DateTime, NaiveDate, Utc};
use dgr_logging::{dgr_debug, log_report_event, LogContext, ReportOutcome};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    aggregate::{aggregate, data_day, GenerationRow, MtdWindow},
    kpi::{compute_kpis, Kpis},
    model::{CustomerProfile, CustomerRegistry},
    normalize::normalize,
    reports::ReportExporter,
    source::{FetchRequest, TelemetrySource},
};

pub use aggregate::DataStatus;
pub use errors::{DgrError, Result};
pub use live::{live_fleet, live_snapshot, LiveSnapshot};
pub use telemetry::TelemetryDocument;

/// Everything produced by one report cycle for one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DgrReport {
    pub customer: String,
    pub report_date: NaiveDate,
    pub data_day: NaiveDate,
    pub window: MtdWindow,
    pub status: DataStatus,
    pub rows: Vec<GenerationRow>,
    pub daily_irradiation: Option<f64>,
    pub monthly_irradiation: Option<f64>,
    pub kpis: Kpis,
    /// Documents dropped for an unaccepted timestamp encoding.
    pub discarded_records: usize,
    pub generated_at: DateTime<Utc>,
}

/// Flat key/value record for tabular export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub customer: String,
    pub report_date: NaiveDate,
    pub data_day: NaiveDate,
    pub status: DataStatus,
    pub total_daily_generation_kwh: f64,
    pub total_monthly_generation_kwh: f64,
    pub plf: f64,
    pub plf_percent: f64,
    pub daily_irradiation: Option<f64>,
    pub monthly_irradiation: Option<f64>,
}

impl DgrReport {
    pub fn is_no_data(&self) -> bool {
        self.status.is_no_data()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            customer: self.customer.clone(),
            report_date: self.report_date,
            data_day: self.data_day,
            status: self.status,
            total_daily_generation_kwh: self.kpis.total_daily_generation,
            total_monthly_generation_kwh: self.kpis.total_monthly_generation,
            plf: self.kpis.plf,
            plf_percent: self.kpis.plf_percent(),
            daily_irradiation: self.daily_irradiation,
            monthly_irradiation: self.monthly_irradiation,
        }
    }

    pub fn exporter(&self) -> ReportExporter<'_> {
        ReportExporter::new(self)
    }
}

/// Inclusive day range to request from the source for `report_date`:
/// the first of the data day's month through the report date itself.
pub fn fetch_window(report_date: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let window = MtdWindow::for_data_day(data_day(report_date)?);
    Ok((window.start, report_date))
}

/// Normalise, aggregate and score an already-fetched batch.
pub fn build_report(
    profile: &CustomerProfile,
    documents: &[TelemetryDocument],
    report_date: NaiveDate,
) -> Result<DgrReport> {
    let table = normalize(profile, documents);
    let aggregation = aggregate(&table, profile, report_date)?;
    let kpis = if aggregation.status.is_no_data() {
        Kpis::zero()
    } else {
        compute_kpis(&aggregation.rows, profile)
    };

    Ok(DgrReport {
        customer: profile.id.clone(),
        report_date,
        data_day: aggregation.data_day,
        window: aggregation.window,
        status: aggregation.status,
        rows: aggregation.rows,
        daily_irradiation: aggregation.daily_irradiation,
        monthly_irradiation: aggregation.monthly_irradiation,
        kpis,
        discarded_records: table.discarded,
        generated_at: Utc::now(),
    })
}

/// Run one report cycle: resolve the profile, fetch the month-to-date window,
/// then build the report. An unknown customer fails before any fetch.
pub fn generate_report<S: TelemetrySource + ?Sized>(
    registry: &CustomerRegistry,
    source: &S,
    customer: &str,
    report_date: NaiveDate,
) -> Result<DgrReport> {
    let profile = registry.get(customer)?;
    let (start, end) = fetch_window(report_date)?;
    let report_date_key = report_date.to_string();
    let ctx = LogContext::new()
        .with_customer(customer)
        .with_report_date(&report_date_key);

    info!(customer, collection = %profile.collection, %start, %end, "fetching telemetry window");
    let documents = source.fetch(&FetchRequest::window(&profile.collection, start, end))?;
    dgr_debug!(context = ctx, "fetched {} documents", documents.len());

    let report = build_report(profile, &documents, report_date)?;
    if report.is_no_data() {
        log_report_event(
            Some(&ctx),
            "report.generate",
            "no telemetry in requested window",
            ReportOutcome::NoData,
        );
    } else {
        log_report_event(
            Some(&ctx),
            "report.generate",
            &format!(
                "daily {:.2} kWh, month-to-date {:.2} kWh, PLF {:.2}%",
                report.kpis.total_daily_generation,
                report.kpis.total_monthly_generation,
                report.kpis.plf_percent()
            ),
            ReportOutcome::Success,
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn fetch_window_spans_month_start_to_report_date() {
        assert_eq!(
            fetch_window(date("2025-11-15")).unwrap(),
            (date("2025-11-01"), date("2025-11-15"))
        );
        // Data day falls in the previous month.
        assert_eq!(
            fetch_window(date("2025-12-01")).unwrap(),
            (date("2025-11-01"), date("2025-12-01"))
        );
    }

    #[test]
    fn generate_report_pipeline() {
        let registry = CustomerRegistry::from_profiles([CustomerProfile::new("Kasturi", 3.0, 23)]);
        let source = MemorySource::new().with_collection(
            "Kasturi",
            vec![
                TelemetryDocument::new()
                    .with("timestamp", "2025-11-13 18:00")
                    .with("Daily_Generation_INV1", 100.0),
                TelemetryDocument::new()
                    .with("timestamp", "2025-11-14 18:00")
                    .with("Daily_Generation_INV1", 120.0),
            ],
        );

        let report = generate_report(&registry, &source, "Kasturi", date("2025-11-15")).unwrap();
        assert_eq!(report.status, DataStatus::Available);
        assert_eq!(report.data_day, date("2025-11-14"));
        assert_eq!(report.kpis.total_daily_generation, 120.0);
        assert_eq!(report.kpis.total_monthly_generation, 220.0);

        let summary = report.summary();
        assert_eq!(summary.customer, "Kasturi");
        assert_eq!(summary.plf_percent, report.kpis.plf * 100.0);
    }

    #[test]
    fn unknown_customer_is_configuration_error() {
        let registry = CustomerRegistry::default();
        let err = generate_report(&registry, &MemorySource::new(), "Ghost", date("2025-11-15"))
            .unwrap_err();
        assert!(matches!(err, DgrError::UnknownCustomer(_)));
    }

    #[test]
    fn empty_source_is_no_data_not_error() {
        let registry = CustomerRegistry::from_profiles([CustomerProfile::new("Kasturi", 3.0, 23)]);
        let report =
            generate_report(&registry, &MemorySource::new(), "Kasturi", date("2025-11-15")).unwrap();
        assert!(report.is_no_data());
        assert_eq!(report.kpis, Kpis::zero());
        assert_eq!(report.daily_irradiation, None);
    }
}
