// Core operations for TrainingState

use crate::config::simulation_config::LearningConfig;
use super::{TrainingState, WeightVector};

impl TrainingState {
    pub fn new(initial_weights: WeightVector) -> Self {
        Self {
            iteration: 0,
            zetas: initial_weights,
            history: Vec::new(),
        }
    }

    pub fn from_config(config: &LearningConfig) -> Self {
        Self::new(config.initial_weights)
    }

    pub fn is_fresh(&self) -> bool {
        self.iteration == 0 && self.history.is_empty()
    }

    pub fn weights(&self) -> &WeightVector {
        &self.zetas
    }

    /// Weights as they were before the most recent update.
    pub fn previous_weights(&self) -> Option<&WeightVector> {
        self.history.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_learning_config_seeds_remaining_weight() {
        let state = TrainingState::from_config(&LearningConfig::default());
        assert!(state.is_fresh());
        assert_eq!(state.weights(), &[0.0, 0.0, 0.0, 10.0, 0.0, 0.0]);
        assert!(state.previous_weights().is_none());
    }
}
