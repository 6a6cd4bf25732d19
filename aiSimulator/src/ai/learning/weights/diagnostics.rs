// Diagnostic and reporting helpers for TrainingState

use crate::ai::features::basis::FEATURE_NAMES;
use super::{TrainingState, WeightVector};

pub fn format_weights(zetas: &WeightVector) -> String {
    let parts: Vec<String> = zetas.iter().map(|w| format!("{:.2}", w)).collect();
    format!("[{}]", parts.join(", "))
}

impl TrainingState {
    /// Euclidean distance between the current weights and the previous ones.
    pub fn last_step_drift(&self) -> Option<f64> {
        self.previous_weights().map(|previous| {
            previous
                .iter()
                .zip(self.zetas.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt()
        })
    }

    pub fn print_summary(&self) {
        println!("📊 Training state: iteration {}, {} history rows", self.iteration, self.history.len());
        for (name, weight) in FEATURE_NAMES.iter().zip(self.zetas.iter()) {
            println!("  {:<10} {:>12.4}", name, weight);
        }
        if let Some(drift) = self.last_step_drift() {
            println!("  last update moved weights by {:.6}", drift);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_are_rounded_for_display() {
        assert_eq!(format_weights(&[0.0, 1.234, -5.0, 10.0, 0.006, 2.0]), "[0.00, 1.23, -5.00, 10.00, 0.01, 2.00]");
    }

    #[test]
    fn drift_measures_the_last_update() {
        let mut state = TrainingState::new([0.0; 6]);
        assert!(state.last_step_drift().is_none());
        state.history.push([0.0; 6]);
        state.zetas = [3.0, 4.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(state.last_step_drift(), Some(5.0));
    }
}
