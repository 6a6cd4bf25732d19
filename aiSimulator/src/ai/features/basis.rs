//! Basis functions of the linear value-function approximation.
//!
//! The same six features feed the decision model's future-cost term and the
//! regression targets of the learning loop.

use serde::{Deserialize, Serialize};

use crate::config::const_funcs;
use crate::models::charger::Charger;
use crate::models::ev::Ev;

pub const NUM_FEATURES: usize = 6;

pub const FEATURE_NAMES: [&str; NUM_FEATURES] =
    ["bias", "scheduled", "available", "remaining", "urgency", "time"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasisFunctions {
    pub bias: f64,
    /// EVs holding a charger assignment
    pub scheduled: f64,
    /// Free connectors summed over chargers
    pub available: f64,
    /// Remaining energy demand over all EVs (kWh)
    pub remaining: f64,
    pub urgency: f64,
    /// Time of day in [0, 1)
    pub time: f64,
}

impl BasisFunctions {
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.bias,
            self.scheduled,
            self.available,
            self.remaining,
            self.urgency,
            self.time,
        ]
    }

    pub fn dot(&self, weights: &[f64; NUM_FEATURES]) -> f64 {
        self.to_array()
            .iter()
            .zip(weights.iter())
            .map(|(feature, weight)| feature * weight)
            .sum()
    }
}

pub fn extract_features(
    evs: &[Ev],
    chargers: &[Charger],
    current_step: usize,
    horizon: usize,
    step_minutes: f64,
) -> BasisFunctions {
    let scheduled = evs.iter().filter(|ev| ev.is_assigned()).count() as f64;

    let available = chargers
        .iter()
        .map(|charger| charger.available_connectors())
        .sum::<usize>() as f64;

    let remaining = evs.iter().map(|ev| ev.remaining_energy_kwh).sum();

    // Assigned or departed EVs add nothing
    let urgency = evs
        .iter()
        .filter(|ev| !ev.is_assigned() && ev.departure_step > current_step)
        .map(|ev| const_funcs::urgency_weight(ev.departure_step, current_step))
        .sum();

    BasisFunctions {
        bias: 1.0,
        scheduled,
        available,
        remaining,
        urgency,
        time: const_funcs::normalized_time(current_step, horizon, step_minutes),
    }
}
