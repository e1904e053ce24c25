//! ---
//! dgr_section: "03-logging"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Structured logging adapters and sinks."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Report-aware logging context and macros for DGR tooling.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Initialize a baseline tracing subscriber suitable for tools and tests.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer())
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Customer (plant) identifier associated with the log event.
    pub customer: Option<&'a str>,
    /// Report date the event belongs to, formatted `YYYY-MM-DD`.
    pub report_date: Option<&'a str>,
    /// Live refresh cycle number.
    pub cycle: Option<u64>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a customer identifier.
    pub fn with_customer(mut self, customer: &'a str) -> Self {
        self.customer = Some(customer);
        self
    }

    /// Attach a report date.
    pub fn with_report_date(mut self, report_date: &'a str) -> Self {
        self.report_date = Some(report_date);
        self
    }

    /// Attach a live refresh cycle number.
    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }
}

/// Outcome of one report or live cycle for a single customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Figures were produced from telemetry.
    Success,
    /// The data source returned nothing for the requested window.
    NoData,
    /// The cycle was aborted (configuration or source failure).
    Fault,
}

impl ReportOutcome {
    /// Stable lowercase name used as the `outcome` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportOutcome::Success => "success",
            ReportOutcome::NoData => "no-data",
            ReportOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized report lifecycle event.
///
/// Success is logged at INFO, no-data at WARN and faults at ERROR.
pub fn log_report_event(
    context: Option<&LogContext<'_>>,
    event: &str,
    message: &str,
    outcome: ReportOutcome,
) {
    let default_ctx = LogContext::default();
    let ctx = context.unwrap_or(&default_ctx);
    let customer = ctx.customer.unwrap_or("");
    let report_date = ctx.report_date.unwrap_or("");
    let cycle = ctx.cycle.unwrap_or_default();
    match outcome {
        ReportOutcome::Success => tracing::info!(
            event,
            outcome = outcome.as_str(),
            customer,
            report_date,
            cycle,
            message = %message
        ),
        ReportOutcome::NoData => tracing::warn!(
            event,
            outcome = outcome.as_str(),
            customer,
            report_date,
            cycle,
            message = %message
        ),
        ReportOutcome::Fault => tracing::error!(
            event,
            outcome = outcome.as_str(),
            customer,
            report_date,
            cycle,
            message = %message
        ),
    }
}
