//! ---
//! dgr_section: "08-generation-reporting"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Normalisation and aggregation routines for generation reporting."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
//! Latest-record view across the fleet.

use chrono::NaiveDateTime;
use dgr_logging::{log_report_event, LogContext, ReportOutcome};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::DataStatus,
    errors::Result,
    kpi::plant_load_factor,
    model::{CustomerProfile, CustomerRegistry},
    normalize::{normalize, row_labels},
    source::{latest_document, FetchRequest, TelemetrySource},
    telemetry::TelemetryDocument,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveRow {
    pub label: String,
    pub column: String,
    pub value: f64,
}

/// Per-device values of a plant's most recent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSnapshot {
    pub customer: String,
    pub status: DataStatus,
    pub as_of: Option<NaiveDateTime>,
    pub day: Option<String>,
    pub rows: Vec<LiveRow>,
    pub irradiation: Option<f64>,
    pub total_generation: f64,
    pub plf: f64,
}

impl LiveSnapshot {
    pub fn plf_percent(&self) -> f64 {
        self.plf * 100.0
    }
}

/// Build a snapshot from whatever the source returned for a latest-record request.
pub fn live_snapshot(profile: &CustomerProfile, documents: Vec<TelemetryDocument>) -> LiveSnapshot {
    let latest: Vec<_> = latest_document(documents).into_iter().collect();
    let table = normalize(profile, &latest);
    let labels = row_labels(profile, &table.columns);

    let Some(record) = table.records.last() else {
        return LiveSnapshot {
            customer: profile.id.clone(),
            status: DataStatus::NoData,
            as_of: None,
            day: None,
            rows: Vec::new(),
            irradiation: None,
            total_generation: 0.0,
            plf: 0.0,
        };
    };

    let rows: Vec<LiveRow> = labels
        .into_iter()
        .zip(&table.columns.generation)
        .zip(&record.generation)
        .map(|((label, column), value)| LiveRow {
            label,
            column: column.clone(),
            value: value * profile.unit_scale,
        })
        .collect();
    let total_generation: f64 = rows.iter().map(|row| row.value).sum();

    LiveSnapshot {
        customer: profile.id.clone(),
        status: DataStatus::Available,
        as_of: Some(record.event_time),
        day: Some(record.day.clone()),
        irradiation: table.columns.irradiation.as_ref().map(|_| record.irradiation),
        total_generation,
        plf: plant_load_factor(total_generation, profile),
        rows,
    }
}

/// Fetch and snapshot one customer.
pub fn live_customer<S: TelemetrySource + ?Sized>(
    profile: &CustomerProfile,
    source: &S,
) -> Result<LiveSnapshot> {
    let documents = source.fetch(&FetchRequest::latest(&profile.collection))?;
    Ok(live_snapshot(profile, documents))
}

/// One independent latest-record cycle per customer, in registry order.
///
/// A failing plant is recorded in its own slot and does not stop the others.
pub fn live_fleet<S: TelemetrySource + ?Sized>(
    registry: &CustomerRegistry,
    source: &S,
    cycle: u64,
) -> IndexMap<String, Result<LiveSnapshot>> {
    let mut results = IndexMap::with_capacity(registry.len());
    for profile in registry.iter() {
        let ctx = LogContext::new().with_customer(&profile.id).with_cycle(cycle);
        let result = live_customer(profile, source);
        match &result {
            Ok(snapshot) if snapshot.status.is_no_data() => log_report_event(
                Some(&ctx),
                "live.snapshot",
                "no telemetry available",
                ReportOutcome::NoData,
            ),
            Ok(snapshot) => log_report_event(
                Some(&ctx),
                "live.snapshot",
                &format!("total {:.2} kWh", snapshot.total_generation),
                ReportOutcome::Success,
            ),
            Err(err) => log_report_event(
                Some(&ctx),
                "live.snapshot",
                &err.to_string(),
                ReportOutcome::Fault,
            ),
        }
        results.insert(profile.id.clone(), result);
    }
    results
}
