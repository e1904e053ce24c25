//! ---
//! dgr_section: "01-core-functionality"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Shared primitives and utilities for the reporting runtime."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{FixedOffset, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;

use crate::logging::LogFormat;

/// Fleet configuration compiled into every binary, used when no file is found.
pub const EMBEDDED_FLEET_CONFIG: &str = include_str!("../../../configs/dgr.toml");

fn default_timezone_offset_minutes() -> i32 {
    330
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(300)
}

fn default_export_directory() -> PathBuf {
    PathBuf::from("reports")
}

fn default_unit_scale() -> f64 {
    1.0
}

fn default_device_label() -> String {
    "Inverter".to_owned()
}

fn default_meter_label() -> String {
    "Meter Generation".to_owned()
}

fn default_total_label() -> String {
    "Total Generation".to_owned()
}

/// Primary configuration object for the reporting runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Offset from UTC, in minutes, of the timezone that defines "today".
    #[serde(default = "default_timezone_offset_minutes")]
    pub timezone_offset_minutes: i32,
    #[serde(default)]
    pub customers: IndexMap<String, CustomerConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    /// `None` when the embedded fleet configuration was used.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "DGR_CONFIG";

    /// Load configuration from disk, respecting the `DGR_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// Resolution order is `DGR_CONFIG`, then the first existing candidate,
    /// then [`EMBEDDED_FLEET_CONFIG`].
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        debug!("no configuration file found; using embedded fleet configuration");
        Ok(LoadedAppConfig {
            config: Self::embedded()?,
            source: None,
        })
    }

    /// Load one named file, bypassing `DGR_CONFIG` and the candidate search.
    pub fn load_file(path: impl AsRef<Path>) -> Result<LoadedAppConfig> {
        let path = path.as_ref().to_path_buf();
        let config = Self::from_path(&path)?;
        Ok(LoadedAppConfig {
            config,
            source: Some(path),
        })
    }

    /// Parse the fleet configuration bundled with the workspace.
    pub fn embedded() -> Result<Self> {
        EMBEDDED_FLEET_CONFIG
            .parse()
            .with_context(|| "embedded fleet configuration is invalid")
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Retrieve a customer profile by identifier.
    pub fn customer(&self, customer_id: &str) -> Option<&CustomerConfig> {
        self.customers.get(customer_id)
    }

    /// The fixed offset reports are dated in.
    pub fn report_timezone(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.timezone_offset_minutes * 60).ok_or_else(|| {
            anyhow!(
                "timezone_offset_minutes {} is out of range",
                self.timezone_offset_minutes
            )
        })
    }

    /// Today's calendar date in the report timezone.
    pub fn today(&self) -> Result<NaiveDate> {
        let offset = self.report_timezone()?;
        Ok(Utc::now().with_timezone(&offset).date_naive())
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.report_timezone()?;
        if self.live.refresh_interval.is_zero() {
            return Err(anyhow!("live.refresh_interval must be at least one second"));
        }
        if self.customers.is_empty() {
            return Err(anyhow!("configuration must contain at least one customer"));
        }
        for (customer_id, customer) in &self.customers {
            customer.validate(customer_id)?;
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timezone_offset_minutes: default_timezone_offset_minutes(),
            customers: IndexMap::new(),
            logging: LoggingConfig::default(),
            live: LiveConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Static per-plant profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerConfig {
    /// Document collection holding the plant's SCADA telemetry.
    pub collection: String,
    /// Per-unit rated capacity used as the PLF denominator base.
    pub rated_capacity_base: f64,
    pub inverter_count: u32,
    #[serde(default)]
    pub detection: DetectionStrategy,
    #[serde(default)]
    pub day_selection: DaySelection,
    /// Multiplier bringing the plant's generation unit to kWh.
    #[serde(default = "default_unit_scale")]
    pub unit_scale: f64,
    /// Prefix for positional device labels (`Inverter-1`, `Inverter-2`, ...).
    #[serde(default = "default_device_label")]
    pub device_label: String,
}

impl CustomerConfig {
    pub fn validate(&self, customer_id: &str) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(anyhow!(
                "customer '{}' must name a telemetry collection",
                customer_id
            ));
        }
        if self.inverter_count == 0 {
            return Err(anyhow!(
                "customer '{}' must declare at least one inverter",
                customer_id
            ));
        }
        if !self.rated_capacity_base.is_finite() || self.rated_capacity_base <= 0.0 {
            return Err(anyhow!(
                "customer '{}' has invalid rated_capacity_base {}",
                customer_id,
                self.rated_capacity_base
            ));
        }
        if !self.unit_scale.is_finite() || self.unit_scale <= 0.0 {
            return Err(anyhow!(
                "customer '{}' has invalid unit_scale {}",
                customer_id,
                self.unit_scale
            ));
        }
        match &self.detection {
            DetectionStrategy::FixedList { columns } if columns.is_empty() => Err(anyhow!(
                "customer '{}' uses fixed_list detection with no columns",
                customer_id
            )),
            DetectionStrategy::SingleTotal { column, .. } if column.trim().is_empty() => {
                Err(anyhow!(
                    "customer '{}' uses single_total detection with an empty column name",
                    customer_id
                ))
            }
            _ => Ok(()),
        }
    }
}

/// How generation columns are picked out of a telemetry batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionStrategy {
    /// Intersect a predefined ordered column list with the batch.
    FixedList { columns: Vec<String> },
    /// Every column carrying the meter-generation marker.
    Meter {
        #[serde(default = "default_meter_label")]
        label: String,
    },
    /// Exactly one named plant-total column.
    SingleTotal {
        column: String,
        #[serde(default = "default_total_label")]
        label: String,
    },
    /// Prefix/substring heuristic over all column names.
    #[default]
    Generic,
}

impl DetectionStrategy {
    /// Fixed row label for strategies reporting one aggregate figure.
    pub fn aggregate_label(&self) -> Option<&str> {
        match self {
            DetectionStrategy::Meter { label } | DetectionStrategy::SingleTotal { label, .. } => {
                Some(label)
            }
            DetectionStrategy::FixedList { .. } | DetectionStrategy::Generic => None,
        }
    }
}

/// Which sample represents a calendar day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DaySelection {
    /// The sample with the latest event time.
    #[default]
    Latest,
    /// The sample at `index` when ordered newest first, falling back to the latest.
    Rank { index: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    #[serde(default = "default_refresh_interval")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub refresh_interval: Duration,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_directory")]
    pub directory: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: default_export_directory(),
        }
    }
}
