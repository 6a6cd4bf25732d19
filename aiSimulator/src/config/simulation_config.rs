use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::ai::features::basis::NUM_FEATURES;
use crate::config::const_funcs;
use crate::config::constants::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffConfig {
    pub offpeak_price: f64,     // $/kWh outside the peak window
    pub peak_price: f64,        // $/kWh inside the peak window
    pub peak_start_hour: f64,   // inclusive
    pub peak_end_hour: f64,     // exclusive
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrivalConfig {
    pub probability: f64,       // Bernoulli arrival chance per training step
    pub energy_kwh: f64,
    pub dwell_min_steps: usize,
    pub dwell_max_steps: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub learning_rate: f64,     // alpha of the exponential smoothing
    pub discount_factor: f64,   // gamma of the cost-to-go targets
    pub initial_weights: [f64; NUM_FEATURES],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    pub directory: PathBuf,
    pub legacy_file: PathBuf,
    pub interval: u64,
    pub max_files: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub horizon_steps: usize,
    pub step_minutes: f64,
    pub penalty_per_kwh: f64,
    pub tariff: TariffConfig,
    pub arrivals: ArrivalConfig,
    pub learning: LearningConfig,
    pub checkpoints: CheckpointConfig,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            offpeak_price: OFFPEAK_PRICE,
            peak_price: PEAK_PRICE,
            peak_start_hour: PEAK_START_HOUR,
            peak_end_hour: PEAK_END_HOUR,
        }
    }
}

impl Default for ArrivalConfig {
    fn default() -> Self {
        Self {
            probability: ARRIVAL_PROBABILITY,
            energy_kwh: ARRIVAL_ENERGY_KWH,
            dwell_min_steps: ARRIVAL_DWELL_MIN_STEPS,
            dwell_max_steps: ARRIVAL_DWELL_MAX_STEPS,
        }
    }
}

impl Default for LearningConfig {
    fn default() -> Self {
        let mut initial_weights = [0.0; NUM_FEATURES];
        initial_weights[3] = INITIAL_REMAINING_WEIGHT;
        Self {
            learning_rate: LEARNING_RATE,
            discount_factor: DISCOUNT_FACTOR,
            initial_weights,
        }
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(CHECKPOINT_DIR),
            legacy_file: PathBuf::from(LEGACY_CHECKPOINT_FILE),
            interval: CHECKPOINT_INTERVAL,
            max_files: MAX_CHECKPOINT_FILES,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon_steps: HORIZON_STEPS,
            step_minutes: STEP_MINUTES,
            penalty_per_kwh: PENALTY_PER_KWH,
            tariff: TariffConfig::default(),
            arrivals: ArrivalConfig::default(),
            learning: LearningConfig::default(),
            checkpoints: CheckpointConfig::default(),
        }
    }
}

impl TariffConfig {
    pub fn price_at(&self, hour: f64) -> f64 {
        if hour >= self.peak_start_hour && hour < self.peak_end_hour {
            self.peak_price
        } else {
            self.offpeak_price
        }
    }
}

impl SimulationConfig {
    /// Reads a JSON configuration file; fields that are absent keep their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        let config: SimulationConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.horizon_steps > 0, "horizon_steps must be positive");
        ensure!(self.step_minutes > 0.0, "step_minutes must be positive");
        ensure!(self.penalty_per_kwh >= 0.0, "penalty_per_kwh must not be negative");
        ensure!(
            (0.0..=1.0).contains(&self.arrivals.probability),
            "arrival probability must lie in [0, 1]"
        );
        ensure!(
            self.arrivals.dwell_min_steps <= self.arrivals.dwell_max_steps,
            "dwell_min_steps must not exceed dwell_max_steps"
        );
        ensure!(
            self.learning.learning_rate > 0.0 && self.learning.learning_rate <= 1.0,
            "learning_rate must lie in (0, 1]"
        );
        ensure!(
            self.learning.discount_factor > 0.0 && self.learning.discount_factor <= 1.0,
            "discount_factor must lie in (0, 1]"
        );
        ensure!(self.checkpoints.interval > 0, "checkpoint interval must be positive");
        ensure!(self.checkpoints.max_files > 0, "checkpoint retention must be positive");
        Ok(())
    }

    pub fn step_hours(&self) -> f64 {
        const_funcs::step_hours(self.step_minutes)
    }

    pub fn price_at(&self, step: usize) -> f64 {
        self.tariff.price_at(const_funcs::hour_of_step(step, self.step_minutes))
    }

    pub fn price_curve(&self) -> Vec<f64> {
        (0..self.horizon_steps).map(|step| self.price_at(step)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.learning.initial_weights, [0.0, 0.0, 0.0, 10.0, 0.0, 0.0]);
    }

    #[test]
    fn peak_window_prices() {
        let config = SimulationConfig::default();
        let prices = config.price_curve();
        assert_eq!(prices.len(), 96);
        assert_eq!(prices[67], 0.15); // 16:45
        assert_eq!(prices[68], 0.50); // 17:00
        assert_eq!(prices[79], 0.50); // 19:45
        assert_eq!(prices[80], 0.15); // 20:00
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "penalty_per_kwh": 50.0, "arrivals": { "probability": 0.3 } }"#)
                .unwrap();
        assert_eq!(config.penalty_per_kwh, 50.0);
        assert_eq!(config.arrivals.probability, 0.3);
        assert_eq!(config.arrivals.energy_kwh, ARRIVAL_ENERGY_KWH);
        assert_eq!(config.horizon_steps, HORIZON_STEPS);
    }

    #[test]
    fn rejects_inverted_dwell_window() {
        let mut config = SimulationConfig::default();
        config.arrivals.dwell_min_steps = 40;
        config.arrivals.dwell_max_steps = 10;
        assert!(config.validate().is_err());
    }
}
