//! ---
//! dgr_section: "08-generation-reporting"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Normalisation and aggregation routines for generation reporting."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
use chrono::NaiveDate;

use crate::{
    errors::{DgrError, Result},
    live::{live_customer, LiveSnapshot},
    model::CustomerRegistry,
    source::MemorySource,
    telemetry::TelemetryDocument,
    DgrReport,
};

#[cfg(feature = "rest-api")]
pub use rest::router;

#[cfg(feature = "rest-api")]
mod rest {
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use std::sync::Arc;

    use crate::errors::DgrError;

    use super::{CustomerRegistry, DgrReport, LiveRequest, LiveSnapshot, ReportRequest};

    pub fn router(registry: CustomerRegistry) -> Router {
        Router::new()
            .route("/api/dgr/report", post(report))
            .route("/api/dgr/live", post(live))
            .with_state(Arc::new(registry))
    }

    async fn report(
        State(registry): State<Arc<CustomerRegistry>>,
        Json(payload): Json<ReportRequest>,
    ) -> Result<Json<DgrReport>, StatusCode> {
        payload.run(&registry).map(Json).map_err(map_err)
    }

    async fn live(
        State(registry): State<Arc<CustomerRegistry>>,
        Json(payload): Json<LiveRequest>,
    ) -> Result<Json<LiveSnapshot>, StatusCode> {
        payload.run(&registry).map(Json).map_err(map_err)
    }

    fn map_err(err: DgrError) -> StatusCode {
        match err {
            DgrError::UnknownCustomer(_) => StatusCode::NOT_FOUND,
            DgrError::InvalidProfile { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            DgrError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Report over documents supplied inline instead of a configured source.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReportRequest {
    pub customer: String,
    pub report_date: NaiveDate,
    #[serde(default)]
    pub documents: Vec<TelemetryDocument>,
}

impl ReportRequest {
    pub fn run(self, registry: &CustomerRegistry) -> Result<DgrReport> {
        let profile = registry.get(&self.customer)?;
        let source = MemorySource::new().with_collection(&profile.collection, self.documents);
        crate::generate_report(registry, &source, &self.customer, self.report_date)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LiveRequest {
    pub customer: String,
    #[serde(default)]
    pub documents: Vec<TelemetryDocument>,
}

impl LiveRequest {
    pub fn run(self, registry: &CustomerRegistry) -> Result<LiveSnapshot> {
        let profile = registry.get(&self.customer)?;
        let source = MemorySource::new().with_collection(&profile.collection, self.documents);
        live_customer(profile, &source)
    }
}

/// Parse a `YYYY-MM-DD` report date.
pub fn parse_report_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| DgrError::InvalidDate(format!("'{raw}': {err}")))
}
