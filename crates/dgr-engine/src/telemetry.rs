//! ---
//! dgr_section: "08-generation-reporting"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Normalisation and aggregation routines for generation reporting."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
//! Raw SCADA documents and the value-level rules applied to them.
//!
//! Documents are schemaless: a timestamp plus whatever measurement columns
//! the plant's logger emits. Two timestamp encodings are accepted:
//!
//! * a native date, written as extended JSON `{"$date": ...}` holding an
//!   RFC 3339 string, epoch milliseconds, or `{"$numberLong": "..."}`;
//! * a string in exactly `YYYY-MM-DD HH:MM` form.
//!
//! Everything else resolves to no timestamp and the document is dropped.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TIMESTAMP_FIELD: &str = "timestamp";
pub const DAY_FIELD: &str = "day";

/// Bookkeeping fields that never hold measurements.
pub const RESERVED_FIELDS: [&str; 4] = ["_id", TIMESTAMP_FIELD, DAY_FIELD, "ts"];

const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";
const DAY_FORMAT: &str = "%Y-%m-%d";

/// One telemetry record as delivered by the data source, fields in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetryDocument(IndexMap<String, Value>);

impl TelemetryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Names of the measurement columns, skipping reserved bookkeeping fields.
    pub fn measurement_columns(&self) -> impl Iterator<Item = &str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|name| !RESERVED_FIELDS.contains(name))
    }

    /// Event time of this record, if its timestamp uses an accepted encoding.
    pub fn event_time(&self) -> Option<NaiveDateTime> {
        self.get(TIMESTAMP_FIELD).and_then(resolve_timestamp)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for TelemetryDocument {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Resolve a timestamp value to naive UTC.
pub fn resolve_timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(raw) if is_minute_pattern(raw) => {
            NaiveDateTime::parse_from_str(raw, MINUTE_FORMAT).ok()
        }
        Value::Object(map) => map.get("$date").and_then(resolve_native_date),
        _ => None,
    }
}

fn resolve_native_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(raw) => DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.naive_utc()),
        Value::Number(millis) => millis
            .as_i64()
            .or_else(|| integral_millis(millis.as_f64()?))
            .and_then(from_epoch_millis),
        Value::Object(map) => map
            .get("$numberLong")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(from_epoch_millis),
        _ => None,
    }
}

/// Millis written as a float (`1.7631234e12`); fractional values are rejected.
fn integral_millis(millis: f64) -> Option<i64> {
    (millis.is_finite() && millis.fract() == 0.0 && millis.abs() < i64::MAX as f64)
        .then(|| millis as i64)
}

fn from_epoch_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

/// `true` when `raw` is shaped exactly like `YYYY-MM-DD HH:MM`.
pub fn is_minute_pattern(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 16
        && bytes.iter().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => *byte == b'-',
            10 => *byte == b' ',
            13 => *byte == b':',
            _ => byte.is_ascii_digit(),
        })
}

/// Canonical `YYYY-MM-DD` key for a calendar date.
pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

/// Reparse an existing `day` field.
///
/// Dates and date-times collapse to their `YYYY-MM-DD` key; a value that does
/// not parse keeps its literal string form. `null` yields `None` so the
/// caller falls back to the timestamp.
pub fn reparse_day(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(raw) => Some(parse_day_string(raw).unwrap_or_else(|| raw.clone())),
        Value::Object(_) => match resolve_timestamp(value) {
            Some(ts) => Some(day_key(ts.date())),
            None => Some(value.to_string()),
        },
        other => Some(other.to_string()),
    }
}

fn parse_day_string(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DAY_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(trimmed, MINUTE_FORMAT)
                .ok()
                .map(|ts| ts.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|ts| ts.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.naive_utc().date())
        })
        .map(day_key)
}

/// Coerce a measurement to a finite number; missing or unparseable is 0.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(raw)) => raw.trim().parse::<f64>().ok(),
        Some(Value::Object(map)) => ["$numberDouble", "$numberInt", "$numberLong", "$numberDecimal"]
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(Value::as_str)
            .and_then(|raw| raw.trim().parse::<f64>().ok()),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}
