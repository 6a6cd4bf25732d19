use serde::Serialize;

use crate::ai::decision::heuristics::HeuristicRule;
use crate::ai::decision::milp::MilpSolver;
use crate::ai::decision::model::DecisionError;
use crate::ai::learning::weights::{TrainingState, WeightVector};
use crate::ai::metrics::simulation_metrics::DayResult;
use crate::config::const_funcs;
use crate::config::simulation_config::SimulationConfig;
use crate::core::simulation::{run_day, DayMode, Strategy};
use crate::data::scenario::Scenario;
use crate::utils::logging::{self, OperationCategory};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// ADP against one heuristic on the same evaluation day.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub iteration: u64,
    pub baseline_rule: HeuristicRule,
    pub adp: DayResult,
    pub baseline: DayResult,
    pub zetas: WeightVector,
    pub history: Vec<WeightVector>,
}

/// Headline numbers for one strategy's day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySummary {
    pub label: String,
    pub total_cost: f64,
    pub energy_cost: f64,
    pub penalty_cost: f64,
    pub delivered_energy_kwh: f64,
    pub service_level: f64,
    pub peak_load_kwh: f64,
    pub peak_window_energy_kwh: f64,
    pub mean_decision_latency_ms: f64,
}

/// Energy delivered while the tariff's peak window is open.
pub fn peak_window_energy(day: &DayResult, config: &SimulationConfig) -> f64 {
    day.load_profile
        .iter()
        .enumerate()
        .filter(|(step, _)| {
            let hour = const_funcs::hour_of_step(*step, config.step_minutes);
            hour >= config.tariff.peak_start_hour && hour < config.tariff.peak_end_hour
        })
        .fold(0.0, |total, (_, kwh)| total + kwh)
}

pub fn summarize_day(label: &str, day: &DayResult, config: &SimulationConfig) -> StrategySummary {
    StrategySummary {
        label: label.to_string(),
        total_cost: day.total_cost,
        energy_cost: day.total_cost - day.penalty_cost,
        penalty_cost: day.penalty_cost,
        delivered_energy_kwh: day.delivered_energy_kwh,
        service_level: day.service_level(),
        peak_load_kwh: day.peak_load_kwh(),
        peak_window_energy_kwh: peak_window_energy(day, config),
        mean_decision_latency_ms: day.mean_decision_latency_secs * 1000.0,
    }
}

/// Relative saving of ADP over the baseline, in percent. `None` when the
/// baseline day cost nothing.
pub fn cost_savings_percent(adp_cost: f64, baseline_cost: f64) -> Option<f64> {
    if baseline_cost.abs() < f64::EPSILON {
        return None;
    }
    Some((baseline_cost - adp_cost) / baseline_cost * 100.0)
}

impl ComparisonReport {
    pub fn adp_summary(&self, config: &SimulationConfig) -> StrategySummary {
        summarize_day("ADP", &self.adp, config)
    }

    pub fn baseline_summary(&self, config: &SimulationConfig) -> StrategySummary {
        summarize_day(self.baseline_rule.label(), &self.baseline, config)
    }

    pub fn cost_savings_percent(&self) -> Option<f64> {
        cost_savings_percent(self.adp.total_cost, self.baseline.total_cost)
    }
}

/// Runs the learned policy and the baseline on the scenario's evaluation day.
pub fn build_comparison_report(
    state: &TrainingState,
    scenario: &Scenario,
    config: &SimulationConfig,
    solver: &dyn MilpSolver,
    baseline_rule: HeuristicRule,
) -> Result<ComparisonReport, DecisionError> {
    let _timing = logging::start_timing("build_comparison_report", OperationCategory::Simulation);

    // evaluation days never draw from the rng
    let mut rng = StdRng::seed_from_u64(0);
    let adp = run_day(&Strategy::Adp(state.zetas), DayMode::Evaluation, scenario, config, solver, &mut rng)?;
    let baseline = run_day(
        &Strategy::heuristic(baseline_rule),
        DayMode::Evaluation,
        scenario,
        config,
        solver,
        &mut rng,
    )?;

    Ok(ComparisonReport {
        iteration: state.iteration,
        baseline_rule,
        adp,
        baseline,
        zetas: state.zetas,
        history: state.history.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::decision::milp::GoodLpSolver;

    #[test]
    fn savings_relative_to_baseline() {
        assert_eq!(cost_savings_percent(75.0, 100.0), Some(25.0));
        assert_eq!(cost_savings_percent(120.0, 100.0), Some(-20.0));
        assert_eq!(cost_savings_percent(5.0, 0.0), None);
    }

    #[test]
    fn peak_window_energy_counts_only_peak_steps() {
        let config = SimulationConfig::default();
        let mut day = DayResult { load_profile: vec![1.0; 96], ..Default::default() };
        // 17:00 to 20:00 is steps 68..80
        day.load_profile[68] = 5.0;
        assert_eq!(peak_window_energy(&day, &config), 16.0);
    }

    #[test]
    fn idle_peak_window_reports_positive_zero() {
        let config = SimulationConfig::default();
        let day = DayResult { load_profile: vec![0.0; 96], ..Default::default() };
        let energy = peak_window_energy(&day, &config);
        assert_eq!(energy, 0.0);
        assert!(energy.is_sign_positive());
        assert_eq!(format!("{:.2}", energy), "0.00");

        let empty = DayResult::default();
        assert!(peak_window_energy(&empty, &config).is_sign_positive());
    }

    #[test]
    fn report_runs_both_strategies_on_the_evaluation_day() {
        let config = SimulationConfig::default();
        let scenario = Scenario::base();
        let state = TrainingState::from_config(&config.learning);

        let report = build_comparison_report(&state, &scenario, &config, &GoodLpSolver, HeuristicRule::Edld).unwrap();

        assert_eq!(report.adp.load_profile.len(), 96);
        assert_eq!(report.baseline.load_profile.len(), 96);
        assert_eq!(report.adp.requested_energy_kwh, report.baseline.requested_energy_kwh);
        assert_eq!(report.baseline_summary(&config).label, "EDLD");
        assert_eq!(report.zetas, state.zetas);
    }
}
