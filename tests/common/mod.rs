#![allow(dead_code)]

use std::path::Path;

use adpcharge::ai::learning::weights::CheckpointStore;
use adpcharge::config::simulation_config::SimulationConfig;
use adpcharge::models::charger::Charger;
use adpcharge::models::ev::Ev;
use tempfile::TempDir;

pub fn tempdir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

/// Default configuration with checkpoints rooted in `root`.
pub fn config_in(root: &Path) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.checkpoints.directory = root.join("checkpoints");
    config.checkpoints.legacy_file = root.join("adp_checkpoint.json");
    config
}

/// Shorter day for training tests.
pub fn short_day_config(root: &Path, horizon: usize, interval: u64) -> SimulationConfig {
    let mut config = config_in(root);
    config.horizon_steps = horizon;
    config.checkpoints.interval = interval;
    config
}

pub fn store_in(config: &SimulationConfig) -> CheckpointStore {
    CheckpointStore::from_config(&config.checkpoints)
}

pub fn single_charger(max_power_kw: f64, connectors: usize) -> Vec<Charger> {
    vec![Charger::new(1, max_power_kw, connectors, false)]
}

pub fn ev(id: u32, departure_step: usize, energy_kwh: f64) -> Ev {
    Ev::new(id, 0, departure_step, energy_kwh)
}
