//! ---
//! dgr_section: "08-generation-reporting"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Normalisation and aggregation routines for generation reporting."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
use dgr_common::config::{AppConfig, CustomerConfig};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use dgr_common::config::{DaySelection, DetectionStrategy};

use crate::errors::{DgrError, Result};

/// Hours in the PLF reference period.
pub const HOURS_PER_DAY: f64 = 24.0;

/// Static, per-plant configuration resolved once per report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub id: String,
    pub collection: String,
    pub rated_capacity_base: f64,
    pub inverter_count: u32,
    pub detection: DetectionStrategy,
    pub day_selection: DaySelection,
    pub unit_scale: f64,
    pub device_label: String,
}

impl CustomerProfile {
    /// Profile with the generic heuristic, latest-of-day selection and kWh units.
    pub fn new(id: impl Into<String>, rated_capacity_base: f64, inverter_count: u32) -> Self {
        let id = id.into();
        Self {
            collection: id.clone(),
            id,
            rated_capacity_base,
            inverter_count,
            detection: DetectionStrategy::Generic,
            day_selection: DaySelection::Latest,
            unit_scale: 1.0,
            device_label: "Inverter".to_owned(),
        }
    }

    pub fn from_config(id: &str, config: &CustomerConfig) -> Result<Self> {
        config
            .validate(id)
            .map_err(|err| DgrError::InvalidProfile {
                customer: id.to_owned(),
                reason: err.to_string(),
            })?;
        Ok(Self {
            id: id.to_owned(),
            collection: config.collection.clone(),
            rated_capacity_base: config.rated_capacity_base,
            inverter_count: config.inverter_count,
            detection: config.detection.clone(),
            day_selection: config.day_selection,
            unit_scale: config.unit_scale,
            device_label: config.device_label.clone(),
        })
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_detection(mut self, detection: DetectionStrategy) -> Self {
        self.detection = detection;
        self
    }

    pub fn with_day_selection(mut self, day_selection: DaySelection) -> Self {
        self.day_selection = day_selection;
        self
    }

    pub fn with_unit_scale(mut self, unit_scale: f64) -> Self {
        self.unit_scale = unit_scale;
        self
    }

    pub fn with_device_label(mut self, device_label: impl Into<String>) -> Self {
        self.device_label = device_label.into();
        self
    }

    /// Theoretical maximum daily energy: 24 h x rated base x unit count.
    pub fn plf_denominator(&self) -> f64 {
        HOURS_PER_DAY * self.rated_capacity_base * f64::from(self.inverter_count)
    }
}

/// Read-only lookup of customer profiles, built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct CustomerRegistry {
    profiles: IndexMap<String, CustomerProfile>,
}

impl CustomerRegistry {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let profiles = config
            .customers
            .iter()
            .map(|(id, customer)| Ok((id.clone(), CustomerProfile::from_config(id, customer)?)))
            .collect::<Result<IndexMap<_, _>>>()?;
        Ok(Self { profiles })
    }

    pub fn from_profiles(profiles: impl IntoIterator<Item = CustomerProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|profile| (profile.id.clone(), profile))
                .collect(),
        }
    }

    /// Look up a profile; an unknown customer is a configuration error.
    pub fn get(&self, customer_id: &str) -> Result<&CustomerProfile> {
        self.profiles
            .get(customer_id)
            .ok_or_else(|| DgrError::UnknownCustomer(customer_id.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomerProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_from_embedded_fleet() {
        let config = AppConfig::embedded().unwrap();
        let registry = CustomerRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len(), config.customers.len());

        let imagica = registry.get("Imagica").unwrap();
        assert_eq!(imagica.collection, "opcua_data");
        assert_eq!(imagica.inverter_count, 18);
        assert!(matches!(
            imagica.detection,
            DetectionStrategy::FixedList { .. }
        ));
    }

    #[test]
    fn unknown_customer_fails_fast() {
        let registry = CustomerRegistry::from_profiles([CustomerProfile::new("Kasturi", 3.0, 23)]);
        match registry.get("Nowhere") {
            Err(DgrError::UnknownCustomer(id)) => assert_eq!(id, "Nowhere"),
            other => panic!("expected UnknownCustomer, got {other:?}"),
        }
    }

    #[test]
    fn invalid_config_becomes_invalid_profile() {
        let config = CustomerConfig {
            collection: "X".into(),
            rated_capacity_base: 0.0,
            inverter_count: 4,
            detection: DetectionStrategy::Generic,
            day_selection: DaySelection::Latest,
            unit_scale: 1.0,
            device_label: "Inverter".into(),
        };
        assert!(matches!(
            CustomerProfile::from_config("X", &config),
            Err(DgrError::InvalidProfile { .. })
        ));
    }

    #[test]
    fn plf_denominator_matches_rated_energy() {
        let profile = CustomerProfile::new("Imagica", 3.06, 18);
        assert!((profile.plf_denominator() - 1321.92).abs() < 1e-9);
    }
}
