//! Site layout and EV arrivals for a simulated day.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::constants::*;
use crate::config::simulation_config::ArrivalConfig;
use crate::models::charger::Charger;
use crate::models::ev::Ev;

/// Chargers, the EVs present at step 0 and the arrivals scheduled for
/// evaluation days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub chargers: Vec<Charger>,
    pub initial_evs: Vec<Ev>,
    #[serde(default)]
    pub scheduled_arrivals: Vec<Ev>,
}

impl Scenario {
    /// Two chargers (22 kW with two connectors, 50 kW fast charger), two EVs
    /// plugged in at midnight and one evaluation arrival at 17:00.
    pub fn base() -> Self {
        Self {
            chargers: vec![
                Charger::new(1, 22.0, 2, false),
                Charger::new(2, 50.0, 1, true),
            ],
            initial_evs: vec![
                Ev::new(1, 0, 32, 40.0),
                Ev::new(2, 0, 90, 60.0),
            ],
            scheduled_arrivals: vec![Ev::new(
                EVALUATION_EV_ID,
                EVALUATION_ARRIVAL_STEP,
                EVALUATION_DEPARTURE_STEP,
                EVALUATION_ENERGY_KWH,
            )],
        }
    }

    pub fn total_connectors(&self) -> usize {
        self.chargers.iter().map(|c| c.connector_count).sum()
    }

    pub fn scheduled_at(&self, step: usize) -> impl Iterator<Item = &Ev> + '_ {
        self.scheduled_arrivals.iter().filter(move |ev| ev.arrival_step == step)
    }

    /// First id handed to stochastically generated EVs; clear of the
    /// initial fleet's ids.
    pub fn first_generated_id(&self) -> u32 {
        let offset_id = TRAINING_EV_ID_OFFSET + self.initial_evs.len() as u32;
        let after_fleet = self.initial_evs.iter().map(|ev| ev.id + 1).max().unwrap_or(0);
        offset_id.max(after_fleet)
    }
}

/// Bernoulli arrivals for training days, with unique increasing ids.
#[derive(Debug, Clone)]
pub struct StochasticArrivals {
    config: ArrivalConfig,
    horizon: usize,
    next_id: u32,
}

impl StochasticArrivals {
    pub fn new(config: ArrivalConfig, horizon: usize, first_id: u32) -> Self {
        Self { config, horizon, next_id: first_id }
    }

    pub fn sample<R: Rng + ?Sized>(&mut self, step: usize, rng: &mut R) -> Option<Ev> {
        if !rng.gen_bool(self.config.probability.clamp(0.0, 1.0)) {
            return None;
        }

        let dwell = if self.config.dwell_max_steps > self.config.dwell_min_steps {
            rng.gen_range(self.config.dwell_min_steps..=self.config.dwell_max_steps)
        } else {
            self.config.dwell_min_steps
        };
        let departure = (step + dwell).min(self.horizon);

        let ev = Ev::new(self.next_id, step, departure, self.config.energy_kwh);
        self.next_id += 1;
        Some(ev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn base_scenario_layout() {
        let scenario = Scenario::base();
        assert_eq!(scenario.total_connectors(), 3);
        assert_eq!(scenario.initial_evs.iter().map(|ev| ev.required_energy_kwh).sum::<f64>(), 100.0);
        assert_eq!(scenario.scheduled_at(68).count(), 1);
        assert_eq!(scenario.scheduled_at(67).count(), 0);
        assert_eq!(scenario.first_generated_id(), 102);
    }

    #[test]
    fn certain_arrivals_get_unique_ids_and_capped_departure() {
        let config = ArrivalConfig { probability: 1.0, ..ArrivalConfig::default() };
        let mut arrivals = StochasticArrivals::new(config, 96, 102);
        let mut rng = StdRng::seed_from_u64(7);

        let first = arrivals.sample(10, &mut rng).unwrap();
        let late = arrivals.sample(80, &mut rng).unwrap();
        assert_eq!((first.id, late.id), (102, 103));
        assert_eq!(first.departure_step, 45);
        assert_eq!(late.departure_step, 96);
        assert_eq!(first.required_energy_kwh, ARRIVAL_ENERGY_KWH);
    }

    #[test]
    fn zero_probability_never_arrives() {
        let config = ArrivalConfig { probability: 0.0, ..ArrivalConfig::default() };
        let mut arrivals = StochasticArrivals::new(config, 96, 102);
        let mut rng = StdRng::seed_from_u64(1);
        assert!((0..96).all(|step| arrivals.sample(step, &mut rng).is_none()));
    }

    #[test]
    fn dwell_window_is_respected() {
        let config = ArrivalConfig {
            probability: 1.0,
            dwell_min_steps: 4,
            dwell_max_steps: 8,
            ..ArrivalConfig::default()
        };
        let mut arrivals = StochasticArrivals::new(config, 96, 102);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let ev = arrivals.sample(10, &mut rng).unwrap();
            assert!((14..=18).contains(&ev.departure_step));
        }
    }
}
