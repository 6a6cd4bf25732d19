use std::time::Instant;

use rand::Rng;
use tracing::debug;

use crate::ai::decision::heuristics::{solve_heuristic, HeuristicRule};
use crate::ai::decision::milp::MilpSolver;
use crate::ai::decision::model::{decide, DecisionContext, DecisionError};
use crate::ai::features::basis::extract_features;
use crate::ai::learning::weights::WeightVector;
use crate::ai::metrics::simulation_metrics::DayResult;
use crate::config::constants::PENALTY_TOLERANCE_KWH;
use crate::config::simulation_config::SimulationConfig;
use crate::data::scenario::{Scenario, StochasticArrivals};
use crate::models::ev::Ev;
use crate::utils::logging::{self, OperationCategory};
use super::actions::apply_assignments;

/// Who makes the per-step charging decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    Adp(WeightVector),
    Fcld,
    Edld,
}

impl Strategy {
    pub fn heuristic(rule: HeuristicRule) -> Self {
        match rule {
            HeuristicRule::Fcld => Strategy::Fcld,
            HeuristicRule::Edld => Strategy::Edld,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Adp(_) => "ADP",
            Strategy::Fcld => HeuristicRule::Fcld.label(),
            Strategy::Edld => HeuristicRule::Edld.label(),
        }
    }

    fn is_adp(&self) -> bool {
        matches!(self, Strategy::Adp(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayMode {
    /// Scheduled arrivals only, reproducible
    Evaluation,
    /// Random arrivals, features always recorded
    Training,
}

/// Simulates one day, step by step, from the scenario's initial fleet.
///
/// Solver failures abort the day; there is no heuristic fallback.
pub fn run_day<R: Rng + ?Sized>(
    strategy: &Strategy,
    mode: DayMode,
    scenario: &Scenario,
    config: &SimulationConfig,
    solver: &dyn MilpSolver,
    rng: &mut R,
) -> Result<DayResult, DecisionError> {
    let _timing = logging::start_timing("run_day", OperationCategory::Simulation);

    let horizon = config.horizon_steps;
    let step_hours = config.step_hours();

    let mut chargers = scenario.chargers.clone();
    let mut evs: Vec<Ev> = scenario.initial_evs.clone();
    let mut arrivals = StochasticArrivals::new(
        config.arrivals.clone(),
        horizon,
        scenario.first_generated_id(),
    );

    let record_features = strategy.is_adp() || mode == DayMode::Training;

    let mut result = DayResult {
        requested_energy_kwh: evs.iter().map(|ev| ev.required_energy_kwh).sum(),
        load_profile: Vec::with_capacity(horizon),
        step_costs: Vec::with_capacity(horizon),
        ..Default::default()
    };
    let mut total_latency = 0.0;

    for step in 0..horizon {
        // 1. arrivals
        let new_evs: Vec<Ev> = match mode {
            DayMode::Evaluation => scenario.scheduled_at(step).cloned().collect(),
            DayMode::Training => arrivals.sample(step, rng).into_iter().collect(),
        };
        result.requested_energy_kwh += new_evs.iter().map(|ev| ev.required_energy_kwh).sum::<f64>();
        evs.extend(new_evs);

        // 2. pre-decision state
        if record_features {
            result
                .feature_history
                .push(extract_features(&evs, &chargers, step, horizon, config.step_minutes));
        }

        // 3. decision
        let price = config.price_at(step);
        let started = Instant::now();
        let assignments = match strategy {
            Strategy::Adp(weights) => {
                let context = DecisionContext {
                    step,
                    energy_price: price,
                    horizon,
                    step_minutes: config.step_minutes,
                };
                decide(&evs, &chargers, &context, weights, solver)?.assignments
            }
            Strategy::Fcld => solve_heuristic(&evs, &chargers, HeuristicRule::Fcld, step_hours),
            Strategy::Edld => solve_heuristic(&evs, &chargers, HeuristicRule::Edld, step_hours),
        };
        total_latency += started.elapsed().as_secs_f64();

        // 4. physics
        let delivery = apply_assignments(&mut evs, &mut chargers, &assignments, step_hours, price)?;
        let mut step_cost = delivery.cost;

        // 5. missed departures
        for ev in evs.iter().filter(|ev| ev.departure_step == step) {
            if ev.remaining_energy_kwh > PENALTY_TOLERANCE_KWH {
                let penalty = ev.remaining_energy_kwh * config.penalty_per_kwh;
                debug!(ev = ev.id, step, unmet_kwh = ev.remaining_energy_kwh, penalty, "EV left short of energy");
                result.penalty_cost += penalty;
                step_cost += penalty;
            }
        }

        // 6. totals
        result.total_cost += step_cost;
        result.delivered_energy_kwh += delivery.energy_kwh;
        result.load_profile.push(delivery.energy_kwh);
        result.step_costs.push(step_cost);

        // 7. retire
        evs.retain(|ev| !ev.has_departed(step));
    }

    if horizon > 0 {
        result.mean_decision_latency_secs = total_latency / horizon as f64;
    }

    debug!(
        strategy = strategy.label(),
        ?mode,
        cost = result.total_cost,
        service_level = result.service_level(),
        "day finished"
    );

    Ok(result)
}
