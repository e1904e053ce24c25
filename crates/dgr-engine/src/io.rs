//! ---
//! dgr_section: "08-generation-reporting"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Normalisation and aggregation routines for generation reporting."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
use std::{fs, io::BufRead, path::Path};

use crate::{errors::Result, telemetry::TelemetryDocument};

/// One JSON document per line; blank lines are skipped.
pub fn load_documents_from_jsonl(path: impl AsRef<Path>) -> Result<Vec<TelemetryDocument>> {
    let file = fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut documents = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        documents.push(serde_json::from_str(&line)?);
    }
    Ok(documents)
}

/// A JSON array of documents.
pub fn load_documents_from_json(path: impl AsRef<Path>) -> Result<Vec<TelemetryDocument>> {
    let data = fs::read_to_string(path)?;
    let documents = serde_json::from_str(&data)?;
    Ok(documents)
}
