//! Value-function weights module
//!
//! Holds the learning state of the linear value-function approximation: the
//! current weight vector ("zetas"), the iteration counter and the append-only
//! history of weight vectors. The implementation of `TrainingState` is split
//! into submodules by concern.

pub mod core;
pub mod learning;
pub mod regression;
pub mod serialization;
pub mod diagnostics;

pub use self::learning::{discounted_cost_to_go, smooth_weights, IterationUpdate};
pub use self::regression::{fit_least_squares, RegressionError};
pub use self::serialization::{CheckpointError, CheckpointStore};

use crate::ai::features::basis::NUM_FEATURES;

/// One coefficient per basis function.
pub type WeightVector = [f64; NUM_FEATURES];

/// Learning state owned by the training loop and borrowed by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingState {
    /// Completed training iterations
    pub iteration: u64,

    /// Current value-function weights
    pub zetas: WeightVector,

    /// Pre-update weights of every iteration, oldest first
    pub history: Vec<WeightVector>,
}
