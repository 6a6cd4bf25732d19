use rand::Rng;

use crate::ai::decision::milp::MilpSolver;
use crate::ai::decision::model::DecisionError;
use crate::ai::learning::weights::{IterationUpdate, TrainingState};
use crate::config::simulation_config::SimulationConfig;
use crate::core::simulation::{run_day, DayMode, Strategy};
use crate::data::scenario::Scenario;
use crate::utils::logging::{self, OperationCategory};

/// One training iteration: a stochastic day driven by the current weights,
/// followed by the value function update.
pub fn run_iteration<R: Rng + ?Sized>(
    state: &mut TrainingState,
    scenario: &Scenario,
    config: &SimulationConfig,
    solver: &dyn MilpSolver,
    rng: &mut R,
) -> Result<IterationUpdate, DecisionError> {
    let _timing = logging::start_timing("run_iteration", OperationCategory::Simulation);

    let strategy = Strategy::Adp(state.zetas);
    let day = run_day(&strategy, DayMode::Training, scenario, config, solver, rng)?;
    Ok(state.learn_from_day(&day, &config.learning))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::decision::milp::GoodLpSolver;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn iteration_counts_and_records_history() {
        let config = SimulationConfig { horizon_steps: 12, ..SimulationConfig::default() };
        let scenario = Scenario::base();
        let mut state = TrainingState::from_config(&config.learning);
        let initial = state.zetas;
        let mut rng = StdRng::seed_from_u64(11);

        let update = run_iteration(&mut state, &scenario, &config, &GoodLpSolver, &mut rng).unwrap();

        assert_eq!(update.iteration, 1);
        assert_eq!(state.iteration, 1);
        assert_eq!(state.history, vec![initial]);
        assert_eq!(update.zetas, state.zetas);
        assert!(update.day_cost >= 0.0);
    }

    #[test]
    fn same_seed_same_update() {
        let config = SimulationConfig { horizon_steps: 16, ..SimulationConfig::default() };
        let scenario = Scenario::base();

        let run = |seed| {
            let mut state = TrainingState::from_config(&config.learning);
            let mut rng = StdRng::seed_from_u64(seed);
            run_iteration(&mut state, &scenario, &config, &GoodLpSolver, &mut rng).unwrap();
            state
        };
        assert_eq!(run(5), run(5));
    }
}
