//! ---
//! dgr_section: "08-generation-reporting"
//! dgr_subsection: "module"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Normalisation and aggregation routines for generation reporting."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::{aggregate::GenerationRow, model::CustomerProfile};

/// Headline figures of a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_daily_generation: f64,
    pub total_monthly_generation: f64,
    /// Plant load factor as a fraction of rated daily energy.
    pub plf: f64,
}

impl Kpis {
    pub fn zero() -> Self {
        Self {
            total_daily_generation: 0.0,
            total_monthly_generation: 0.0,
            plf: 0.0,
        }
    }

    pub fn plf_percent(&self) -> f64 {
        self.plf * 100.0
    }
}

/// `total_daily / (24 x rated_base x inverter_count)`, or 0 when the denominator is 0.
pub fn plant_load_factor(total_daily_generation: f64, profile: &CustomerProfile) -> f64 {
    let denominator = profile.plf_denominator();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    total_daily_generation / denominator
}

pub fn compute_kpis(rows: &[GenerationRow], profile: &CustomerProfile) -> Kpis {
    let total_daily_generation: f64 = rows.iter().map(|row| row.daily).sum();
    let total_monthly_generation: f64 = rows.iter().map(|row| row.monthly).sum();
    Kpis {
        total_daily_generation,
        total_monthly_generation,
        plf: plant_load_factor(total_daily_generation, profile),
    }
}
