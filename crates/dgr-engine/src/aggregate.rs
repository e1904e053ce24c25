//! ---
//! dgr_section: "08-generation-reporting"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Normalisation and aggregation routines for generation reporting."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
//! Daily and month-to-date aggregation over a normalised table.
//!
//! The data day is the report date minus one calendar day. Every figure is
//! built from one selected sample per calendar day, joined onto a dense
//! calendar of the month-to-date window so days without telemetry count as 0.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{DgrError, Result},
    model::{CustomerProfile, DaySelection},
    normalize::{row_labels, NormalizedRecord, NormalizedTable},
    telemetry::day_key,
};

/// Whether a report was built from telemetry or short-circuited to zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataStatus {
    Available,
    NoData,
}

impl DataStatus {
    pub fn is_no_data(&self) -> bool {
        matches!(self, DataStatus::NoData)
    }
}

/// The calendar day a report for `report_date` describes.
pub fn data_day(report_date: NaiveDate) -> Result<NaiveDate> {
    report_date
        .pred_opt()
        .ok_or_else(|| DgrError::InvalidDate(format!("{report_date} has no preceding day")))
}

/// Inclusive month-to-date window ending on the data day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MtdWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MtdWindow {
    pub fn for_data_day(data_day: NaiveDate) -> Self {
        Self {
            start: data_day.with_day(1).unwrap_or(data_day),
            end: data_day,
        }
    }

    /// Every date in the window, start and end included.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|day| *day <= self.end)
            .collect()
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The sample chosen to represent one calendar day, unit scale applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySample {
    pub event_time: NaiveDateTime,
    pub generation: Vec<f64>,
    pub irradiation: f64,
}

/// Reduce the table to one sample per day key.
///
/// Each day's rows are ordered newest first; [`DaySelection::Latest`] takes
/// the first, [`DaySelection::Rank`] takes the row at `index` and falls back
/// to the newest when the day has fewer rows.
pub fn select_daily_samples(
    table: &NormalizedTable,
    selection: DaySelection,
    unit_scale: f64,
) -> HashMap<String, DaySample> {
    let mut by_day: HashMap<&str, Vec<&NormalizedRecord>> = HashMap::new();
    for record in &table.records {
        by_day.entry(record.day.as_str()).or_default().push(record);
    }

    by_day
        .into_iter()
        .filter_map(|(day, mut rows)| {
            // Stable sort keeps later-inserted rows first among equal event times.
            rows.reverse();
            rows.sort_by(|a, b| b.event_time.cmp(&a.event_time));
            let chosen = match selection {
                DaySelection::Latest => rows.first(),
                DaySelection::Rank { index } => rows.get(index).or_else(|| rows.first()),
            }?;
            Some((
                day.to_owned(),
                DaySample {
                    event_time: chosen.event_time,
                    generation: chosen.generation.iter().map(|v| v * unit_scale).collect(),
                    irradiation: chosen.irradiation,
                },
            ))
        })
        .collect()
}

/// One calendar entry of the dense month-to-date join.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEntry {
    pub date: NaiveDate,
    pub generation: Vec<f64>,
    pub irradiation: f64,
    /// A sample existed for this date.
    pub observed: bool,
}

/// Left-join the per-day samples onto every date of `window`, zero-filling gaps.
pub fn dense_calendar(
    window: &MtdWindow,
    samples: &HashMap<String, DaySample>,
    column_count: usize,
) -> Vec<CalendarEntry> {
    window
        .days()
        .into_iter()
        .map(|date| match samples.get(&day_key(date)) {
            Some(sample) => CalendarEntry {
                date,
                generation: sample.generation.clone(),
                irradiation: sample.irradiation,
                observed: true,
            },
            None => CalendarEntry {
                date,
                generation: vec![0.0; column_count],
                irradiation: 0.0,
                observed: false,
            },
        })
        .collect()
}

/// Daily and month-to-date generation for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRow {
    pub label: String,
    pub column: String,
    pub daily: f64,
    pub monthly: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub data_day: NaiveDate,
    pub window: MtdWindow,
    pub status: DataStatus,
    pub rows: Vec<GenerationRow>,
    /// Present only when an irradiation column was detected.
    pub daily_irradiation: Option<f64>,
    /// Arithmetic mean over the dense window; absent days count as 0.
    pub monthly_irradiation: Option<f64>,
    /// Calendar days in the window that had at least one sample.
    pub observed_days: usize,
}

/// Compute daily and month-to-date figures for `report_date`.
pub fn aggregate(
    table: &NormalizedTable,
    profile: &CustomerProfile,
    report_date: NaiveDate,
) -> Result<Aggregation> {
    let data_day = data_day(report_date)?;
    let window = MtdWindow::for_data_day(data_day);
    let labels = row_labels(profile, &table.columns);
    let column_count = table.columns.generation.len();

    if table.is_empty() {
        let rows = labels
            .into_iter()
            .zip(&table.columns.generation)
            .map(|(label, column)| GenerationRow {
                label,
                column: column.clone(),
                daily: 0.0,
                monthly: 0.0,
            })
            .collect();
        return Ok(Aggregation {
            data_day,
            window,
            status: DataStatus::NoData,
            rows,
            daily_irradiation: None,
            monthly_irradiation: None,
            observed_days: 0,
        });
    }

    let samples = select_daily_samples(table, profile.day_selection, profile.unit_scale);
    let daily_sample = samples.get(&day_key(data_day));
    let daily: Vec<f64> = daily_sample
        .map(|sample| sample.generation.clone())
        .unwrap_or_else(|| vec![0.0; column_count]);

    let calendar = dense_calendar(&window, &samples, column_count);
    let mut monthly = vec![0.0; column_count];
    for entry in &calendar {
        for (total, value) in monthly.iter_mut().zip(&entry.generation) {
            *total += value;
        }
    }

    let (daily_irradiation, monthly_irradiation) = if table.columns.irradiation.is_some() {
        let daily = daily_sample.map(|sample| sample.irradiation).unwrap_or(0.0);
        let sum: f64 = calendar.iter().map(|entry| entry.irradiation).sum();
        let mean = if calendar.is_empty() {
            0.0
        } else {
            sum / calendar.len() as f64
        };
        (Some(daily), Some(mean))
    } else {
        (None, None)
    };

    let rows = labels
        .into_iter()
        .zip(&table.columns.generation)
        .enumerate()
        .map(|(idx, (label, column))| GenerationRow {
            label,
            column: column.clone(),
            daily: daily[idx],
            monthly: monthly[idx],
        })
        .collect();

    Ok(Aggregation {
        data_day,
        window,
        status: DataStatus::Available,
        rows,
        daily_irradiation,
        monthly_irradiation,
        observed_days: calendar.iter().filter(|entry| entry.observed).count(),
    })
}
