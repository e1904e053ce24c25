//! ---
//! dgr_section: "01-core-functionality"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Shared primitives and utilities for the reporting runtime."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
//! Shared primitives for the DGR workspace.
//! This crate exposes fleet configuration loading (customer profiles,
//! logging, live refresh, export settings) and tracing initialisation.

pub mod config;
pub mod logging;

pub use config::{
    AppConfig, CustomerConfig, DaySelection, DetectionStrategy, ExportConfig, LiveConfig,
    LoadedAppConfig, LoggingConfig,
};
pub use logging::{init_tracing, LogFormat};
