//! ---
//! dgr_section: "08-generation-reporting"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Normalisation and aggregation routines for generation reporting."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
//! Boundary to the telemetry store.
//!
//! A source answers two kinds of request for a collection: every document
//! whose day falls in an inclusive window, or the single most recent
//! document. Documents without an accepted timestamp never leave the source.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::debug;

use crate::{
    errors::Result,
    io::{load_documents_from_json, load_documents_from_jsonl},
    telemetry::TelemetryDocument,
};

/// Upper bound on documents returned for one window request.
pub const WINDOW_DOCUMENT_LIMIT: usize = 200_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Documents whose day lies in `[start, end]`, oldest first.
    Window { start: NaiveDate, end: NaiveDate },
    /// Only the most recent document.
    Latest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub collection: String,
    pub mode: FetchMode,
}

impl FetchRequest {
    pub fn window(collection: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            collection: collection.into(),
            mode: FetchMode::Window { start, end },
        }
    }

    pub fn latest(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            mode: FetchMode::Latest,
        }
    }
}

pub trait TelemetrySource {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<TelemetryDocument>>;
}

/// Apply a request's mode to a raw collection.
pub fn apply_mode(documents: Vec<TelemetryDocument>, mode: FetchMode) -> Vec<TelemetryDocument> {
    match mode {
        FetchMode::Window { start, end } => filter_window(documents, start, end),
        FetchMode::Latest => latest_document(documents).into_iter().collect(),
    }
}

/// Keep documents with an accepted timestamp whose day is in `[start, end]`,
/// capped at [`WINDOW_DOCUMENT_LIMIT`] and sorted by event time.
pub fn filter_window(
    documents: Vec<TelemetryDocument>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<TelemetryDocument> {
    let mut kept: Vec<_> = documents
        .into_iter()
        .filter_map(|document| {
            let ts = document.event_time()?;
            let day = ts.date();
            (start <= day && day <= end).then_some((ts, document))
        })
        .take(WINDOW_DOCUMENT_LIMIT)
        .collect();
    kept.sort_by_key(|(ts, _)| *ts);
    kept.into_iter().map(|(_, document)| document).collect()
}

/// The document with the greatest accepted timestamp; the first wins ties.
pub fn latest_document(documents: Vec<TelemetryDocument>) -> Option<TelemetryDocument> {
    let mut latest: Option<(chrono::NaiveDateTime, TelemetryDocument)> = None;
    for document in documents {
        let Some(ts) = document.event_time() else {
            continue;
        };
        if latest.as_ref().map_or(true, |(best, _)| ts > *best) {
            latest = Some((ts, document));
        }
    }
    latest.map(|(_, document)| document)
}

/// Collections stored as `<root>/<collection>.jsonl` or `<root>/<collection>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    root: PathBuf,
}

impl JsonDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn load_collection(&self, collection: &str) -> Result<Vec<TelemetryDocument>> {
        let jsonl = self.root.join(format!("{collection}.jsonl"));
        if jsonl.is_file() {
            return load_documents_from_jsonl(jsonl);
        }
        let json = self.root.join(format!("{collection}.json"));
        if json.is_file() {
            return load_documents_from_json(json);
        }
        debug!(collection, root = %self.root.display(), "collection file not found");
        Ok(Vec::new())
    }
}

impl TelemetrySource for JsonDirectorySource {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<TelemetryDocument>> {
        let documents = self.load_collection(&request.collection)?;
        let total = documents.len();
        let fetched = apply_mode(documents, request.mode);
        debug!(
            collection = %request.collection,
            total,
            fetched = fetched.len(),
            "collection fetched"
        );
        Ok(fetched)
    }
}

/// In-memory collections.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    collections: HashMap<String, Vec<TelemetryDocument>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: impl Into<String>, documents: Vec<TelemetryDocument>) {
        self.collections.insert(collection.into(), documents);
    }

    pub fn with_collection(
        mut self,
        collection: impl Into<String>,
        documents: Vec<TelemetryDocument>,
    ) -> Self {
        self.insert(collection, documents);
        self
    }
}

impl TelemetrySource for MemorySource {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<TelemetryDocument>> {
        let documents = self
            .collections
            .get(&request.collection)
            .cloned()
            .unwrap_or_default();
        Ok(apply_mode(documents, request.mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn doc(ts: serde_json::Value, value: f64) -> TelemetryDocument {
        TelemetryDocument::new()
            .with("timestamp", ts)
            .with("Daily_Generation_INV1", value)
    }

    #[test]
    fn window_is_inclusive_and_sorted() {
        let docs = vec![
            doc(json!("2025-11-15 00:00"), 4.0),
            doc(json!("2025-11-01 00:00"), 1.0),
            doc(json!("2025-10-31 23:59"), 0.0),
            doc(json!({"$date": "2025-11-07T12:00:00Z"}), 2.0),
            doc(json!("2025-11-16 00:00"), 5.0),
            doc(json!("not a time"), 9.0),
        ];
        let kept = filter_window(docs, date("2025-11-01"), date("2025-11-15"));
        let values: Vec<f64> = kept
            .iter()
            .map(|d| d.get("Daily_Generation_INV1").and_then(|v| v.as_f64()).unwrap())
            .collect();
        assert_eq!(values, vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn latest_ignores_unresolvable_timestamps() {
        let docs = vec![
            doc(json!("2025-11-14 10:00"), 1.0),
            doc(json!("2025-11-14 12:00"), 2.0),
            doc(json!("2025-11-14T23:00:00"), 3.0),
        ];
        let latest = latest_document(docs).unwrap();
        assert_eq!(latest.get("Daily_Generation_INV1"), Some(&json!(2.0)));
        assert!(latest_document(Vec::new()).is_none());
    }

    #[test]
    fn memory_source_honours_mode() {
        let source = MemorySource::new().with_collection(
            "Kasturi",
            vec![
                doc(json!("2025-11-13 10:00"), 1.0),
                doc(json!("2025-11-14 10:00"), 2.0),
            ],
        );
        let latest = source.fetch(&FetchRequest::latest("Kasturi")).unwrap();
        assert_eq!(latest.len(), 1);
        let window = source
            .fetch(&FetchRequest::window(
                "Kasturi",
                date("2025-11-13"),
                date("2025-11-13"),
            ))
            .unwrap();
        assert_eq!(window.len(), 1);
        assert!(source
            .fetch(&FetchRequest::latest("Unknown"))
            .unwrap()
            .is_empty());
    }
}
