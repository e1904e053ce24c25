//! ---
//! dgr_section: "08-generation-reporting"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Normalisation and aggregation routines for generation reporting."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DgrError>;

/// Structural failures. Value coercion never produces one of these, and an
/// empty telemetry window is reported through [`crate::DataStatus`] instead.
#[derive(Debug, Error)]
pub enum DgrError {
    #[error("customer '{0}' has no profile (rated capacity / inverter count) configured")]
    UnknownCustomer(String),
    #[error("customer '{customer}' has an invalid profile: {reason}")]
    InvalidProfile { customer: String, reason: String },
    #[error("invalid report date: {0}")]
    InvalidDate(String),
    #[error("telemetry source error: {0}")]
    Source(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationFailed(#[from] serde_json::Error),
    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),
}
