// Approximate value iteration update for TrainingState

use tracing::{debug, warn};

use crate::ai::metrics::simulation_metrics::DayResult;
use crate::config::simulation_config::LearningConfig;
use crate::utils::logging::{self, OperationCategory, WeightsUpdateType};
use super::regression::{fit_least_squares, RegressionError};
use super::{TrainingState, WeightVector};

/// What one call to [`TrainingState::learn_from_day`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationUpdate {
    pub iteration: u64,
    pub day_cost: f64,
    /// Regression output before smoothing, or why there was none
    pub candidate: Result<WeightVector, RegressionError>,
    pub zetas: WeightVector,
}

/// `V_t = Σ_{k ≥ t} γ^(k−t) · c_k`, computed backwards in one pass.
pub fn discounted_cost_to_go(step_costs: &[f64], discount: f64) -> Vec<f64> {
    let mut targets = vec![0.0; step_costs.len()];
    let mut running = 0.0;
    for (t, cost) in step_costs.iter().enumerate().rev() {
        running = cost + discount * running;
        targets[t] = running;
    }
    targets
}

/// `(1 − α) · old + α · candidate`
pub fn smooth_weights(old: &WeightVector, candidate: &WeightVector, alpha: f64) -> WeightVector {
    let mut blended = *old;
    for (weight, target) in blended.iter_mut().zip(candidate.iter()) {
        *weight = (1.0 - alpha) * *weight + alpha * target;
    }
    blended
}

impl TrainingState {
    /// Counts the iteration, records the current weights in the history and
    /// moves them towards the least-squares fit of this day's cost-to-go.
    ///
    /// A failed fit leaves the weights unchanged; the iteration and its
    /// history row still count.
    pub fn learn_from_day(&mut self, day: &DayResult, config: &LearningConfig) -> IterationUpdate {
        self.iteration += 1;
        self.history.push(self.zetas);

        let targets = discounted_cost_to_go(&day.step_costs, config.discount_factor);
        let candidate = fit_least_squares(&day.feature_history, &targets);

        match &candidate {
            Ok(fitted) => {
                let _timing = logging::start_timing(
                    "smooth_weights",
                    OperationCategory::WeightsUpdate { subcategory: WeightsUpdateType::Smoothing },
                );
                self.zetas = smooth_weights(&self.zetas, fitted, config.learning_rate);
                debug!(iteration = self.iteration, zetas = ?self.zetas, "weights updated");
            }
            Err(e) => {
                warn!(iteration = self.iteration, error = %e, "regression skipped, keeping weights");
            }
        }

        IterationUpdate {
            iteration: self.iteration,
            day_cost: day.total_cost,
            candidate,
            zetas: self.zetas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::features::basis::BasisFunctions;

    #[test]
    fn cost_to_go_accumulates_discounted_future() {
        let targets = discounted_cost_to_go(&[1.0, 2.0, 3.0], 0.5);
        assert_eq!(targets, vec![1.0 + 0.5 * 2.0 + 0.25 * 3.0, 2.0 + 0.5 * 3.0, 3.0]);
        assert!(discounted_cost_to_go(&[], 0.99).is_empty());
    }

    #[test]
    fn smoothing_moves_a_small_step() {
        let old = [0.0, 0.0, 0.0, 10.0, 0.0, 0.0];
        let candidate = [100.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let blended = smooth_weights(&old, &candidate, 0.01);
        assert!((blended[0] - 1.0).abs() < 1e-12);
        assert!((blended[3] - 9.9).abs() < 1e-12);
    }

    #[test]
    fn empty_day_keeps_weights_but_counts_iteration() {
        let config = LearningConfig::default();
        let mut state = TrainingState::from_config(&config);
        let update = state.learn_from_day(&DayResult::default(), &config);

        assert_eq!(update.iteration, 1);
        assert_eq!(update.candidate, Err(RegressionError::Empty));
        assert_eq!(state.zetas, config.initial_weights);
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn history_records_pre_update_weights() {
        let config = LearningConfig::default();
        let mut state = TrainingState::from_config(&config);
        let before = state.zetas;

        let day = DayResult {
            total_cost: 3.0,
            step_costs: vec![1.0, 1.0, 1.0],
            feature_history: vec![
                BasisFunctions { bias: 1.0, scheduled: 0.0, available: 3.0, remaining: 30.0, urgency: 0.1, time: 0.0 },
                BasisFunctions { bias: 1.0, scheduled: 1.0, available: 2.0, remaining: 20.0, urgency: 0.0, time: 0.1 },
                BasisFunctions { bias: 1.0, scheduled: 1.0, available: 2.0, remaining: 10.0, urgency: 0.0, time: 0.2 },
            ],
            ..Default::default()
        };
        let update = state.learn_from_day(&day, &config);

        assert_eq!(state.history, vec![before]);
        assert!(update.candidate.is_ok());
        assert_ne!(state.zetas, before);
    }
}
