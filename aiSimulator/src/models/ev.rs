use serde::{Deserialize, Serialize};

use crate::config::constants::ENERGY_EPSILON_KWH;

/// An electric vehicle waiting for, or receiving, charge.
///
/// Lives for one simulated day: created at `arrival_step`, mutated every step it
/// is active, and retired once `departure_step` is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ev {
    pub id: u32,
    pub arrival_step: usize,
    pub departure_step: usize,
    /// Total energy requested on arrival (kWh)
    pub required_energy_kwh: f64,
    /// Energy still missing (kWh); never negative, never above the request
    pub remaining_energy_kwh: f64,
    #[serde(default)]
    pub assigned_charger: Option<u32>,
    #[serde(default)]
    pub assigned_connector: Option<usize>,
}

impl Ev {
    pub fn new(id: u32, arrival_step: usize, departure_step: usize, required_energy_kwh: f64) -> Self {
        let required = required_energy_kwh.max(0.0);
        Self {
            id,
            arrival_step,
            departure_step,
            required_energy_kwh: required,
            remaining_energy_kwh: required,
            assigned_charger: None,
            assigned_connector: None,
        }
    }

    pub fn needs_energy(&self) -> bool {
        self.remaining_energy_kwh > ENERGY_EPSILON_KWH
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_charger.is_some()
    }

    pub fn has_departed(&self, step: usize) -> bool {
        self.departure_step <= step
    }

    pub fn assign(&mut self, charger_id: u32, connector: usize) {
        self.assigned_charger = Some(charger_id);
        self.assigned_connector = Some(connector);
    }

    /// Delivers up to `energy_kwh`, clamped to what is still missing.
    /// Returns the energy actually transferred.
    pub fn deliver(&mut self, energy_kwh: f64) -> f64 {
        let delivered = energy_kwh.max(0.0).min(self.remaining_energy_kwh);
        self.remaining_energy_kwh -= delivered;
        delivered
    }
}
