// Simulation Metrics module - contains the per-day DayResult record
use serde::{Serialize, Deserialize};

use crate::ai::features::basis::BasisFunctions;
use crate::config::const_funcs;

/// Everything one simulated day produces, for learning and for reporting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayResult {
    pub total_cost: f64,
    pub delivered_energy_kwh: f64,
    pub requested_energy_kwh: f64,
    pub penalty_cost: f64,
    /// Energy delivered in each step (kWh)
    pub load_profile: Vec<f64>,
    /// Pre-decision features, one per step when recorded
    pub feature_history: Vec<BasisFunctions>,
    pub step_costs: Vec<f64>,
    /// Mean wall-clock time of the per-step decision (seconds)
    pub mean_decision_latency_secs: f64,
}

impl DayResult {
    pub fn service_level(&self) -> f64 {
        const_funcs::service_level_percent(self.delivered_energy_kwh, self.requested_energy_kwh)
    }

    pub fn peak_load_kwh(&self) -> f64 {
        self.load_profile.iter().copied().fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_day_is_fully_served() {
        let result = DayResult::default();
        assert_eq!(result.service_level(), 100.0);
        assert_eq!(result.peak_load_kwh(), 0.0);
    }

    #[test]
    fn service_level_is_delivered_share() {
        let result = DayResult {
            delivered_energy_kwh: 75.0,
            requested_energy_kwh: 100.0,
            load_profile: vec![1.0, 5.5, 2.0],
            ..Default::default()
        };
        assert!((result.service_level() - 75.0).abs() < 1e-12);
        assert_eq!(result.peak_load_kwh(), 5.5);
    }
}
