//! ---
//! dgr_section: "08-generation-reporting"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Normalisation and aggregation routines for generation reporting."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
//! Column detection and per-record cleaning.

use chrono::NaiveDateTime;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    model::{CustomerProfile, DetectionStrategy},
    telemetry::{coerce_number, day_key, reparse_day, TelemetryDocument, DAY_FIELD},
};

/// Column-name prefixes of per-inverter daily generation counters.
pub const GENERATION_PREFIXES: [&str; 3] = ["Daily_Generation_INV", "T1_", "T2_"];
/// Substring marking a per-device daily generation counter.
pub const GENERATION_MARKER: &str = "_Daily_Generation";
/// Substring marking meter-based generation.
pub const METER_MARKER: &str = "Meter_Generation";
/// Case-insensitive substring marking an irradiation column.
pub const IRRADIATION_MARKER: &str = "irradiation";
/// Synthetic zero-valued column used when the heuristic finds nothing.
pub const PLACEHOLDER_COLUMN: &str = "__no_generation_columns__";

/// Columns chosen for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelection {
    /// Generation columns in label order.
    pub generation: Vec<String>,
    pub irradiation: Option<String>,
    /// `generation` holds only [`PLACEHOLDER_COLUMN`].
    pub placeholder: bool,
}

/// A cleaned record: numeric generation aligned with [`ColumnSelection::generation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub event_time: NaiveDateTime,
    pub day: String,
    pub generation: Vec<f64>,
    /// 0 when the batch has no irradiation column.
    pub irradiation: f64,
}

/// Normalised batch for one customer, sorted by event time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTable {
    pub columns: ColumnSelection,
    pub records: Vec<NormalizedRecord>,
    /// Documents dropped because their timestamp encoding was not accepted.
    pub discarded: usize,
}

impl NormalizedTable {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Measurement columns across a batch, in order of first appearance.
pub fn available_columns(documents: &[TelemetryDocument]) -> Vec<String> {
    let mut seen: IndexSet<&str> = IndexSet::new();
    for document in documents {
        seen.extend(document.measurement_columns());
    }
    seen.into_iter().map(str::to_owned).collect()
}

fn is_irradiation(column: &str) -> bool {
    column.to_lowercase().contains(IRRADIATION_MARKER)
}

fn is_generic_generation(column: &str) -> bool {
    !is_irradiation(column)
        && (GENERATION_PREFIXES
            .iter()
            .any(|prefix| column.starts_with(prefix))
            || column.contains(GENERATION_MARKER)
            || column.contains(METER_MARKER))
}

/// Pick generation and irradiation columns according to the customer's strategy.
pub fn detect_columns(strategy: &DetectionStrategy, available: &[String]) -> ColumnSelection {
    let mut placeholder = false;
    let generation = match strategy {
        DetectionStrategy::FixedList { columns } => columns
            .iter()
            .filter(|column| available.contains(column))
            .cloned()
            .collect(),
        DetectionStrategy::Meter { .. } => available
            .iter()
            .filter(|column| column.contains(METER_MARKER))
            .cloned()
            .collect(),
        DetectionStrategy::SingleTotal { column, .. } => available
            .iter()
            .find(|candidate| *candidate == column)
            .cloned()
            .into_iter()
            .collect(),
        DetectionStrategy::Generic => {
            let found: Vec<String> = available
                .iter()
                .filter(|column| is_generic_generation(column))
                .cloned()
                .collect();
            if found.is_empty() {
                placeholder = true;
                vec![PLACEHOLDER_COLUMN.to_owned()]
            } else {
                found
            }
        }
    };

    let irradiation = available
        .iter()
        .find(|column| is_irradiation(column))
        .cloned();

    ColumnSelection {
        generation,
        irradiation,
        placeholder,
    }
}

/// Row labels for a selection: a fixed name for single-figure strategies,
/// otherwise `<device_label>-<n>` in detection order.
pub fn row_labels(profile: &CustomerProfile, selection: &ColumnSelection) -> Vec<String> {
    let count = selection.generation.len();
    match profile.detection.aggregate_label() {
        Some(label) if count == 1 => vec![label.to_owned()],
        Some(label) => (1..=count).map(|n| format!("{label}-{n}")).collect(),
        None => (1..=count)
            .map(|n| format!("{}-{n}", profile.device_label))
            .collect(),
    }
}

/// Clean a batch: detect columns, coerce values, derive day keys, sort by event time.
///
/// Documents without an accepted timestamp are dropped. Generation values are
/// clamped at 0; irradiation keeps its sign.
pub fn normalize(profile: &CustomerProfile, documents: &[TelemetryDocument]) -> NormalizedTable {
    let available = available_columns(documents);
    let columns = detect_columns(&profile.detection, &available);
    debug!(
        customer = %profile.id,
        generation = ?columns.generation,
        irradiation = ?columns.irradiation,
        placeholder = columns.placeholder,
        "columns detected"
    );

    let mut discarded = 0usize;
    let mut records = Vec::with_capacity(documents.len());
    for document in documents {
        let Some(event_time) = document.event_time() else {
            discarded += 1;
            continue;
        };
        let day = document
            .get(DAY_FIELD)
            .and_then(reparse_day)
            .unwrap_or_else(|| day_key(event_time.date()));
        let generation = columns
            .generation
            .iter()
            .map(|column| coerce_number(document.get(column)).max(0.0))
            .collect();
        let irradiation = columns
            .irradiation
            .as_deref()
            .map(|column| coerce_number(document.get(column)))
            .unwrap_or(0.0);
        records.push(NormalizedRecord {
            event_time,
            day,
            generation,
            irradiation,
        });
    }
    records.sort_by_key(|record| record.event_time);

    if discarded > 0 {
        debug!(customer = %profile.id, discarded, "dropped records without an accepted timestamp");
    }

    NormalizedTable {
        columns,
        records,
        discarded,
    }
}
