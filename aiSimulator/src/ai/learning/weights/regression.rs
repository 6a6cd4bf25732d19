// Least-squares fit of the value-function weights

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::ai::features::basis::{BasisFunctions, NUM_FEATURES};
use crate::utils::logging::{self, OperationCategory, WeightsUpdateType};
use super::WeightVector;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegressionError {
    #[error("no samples to fit")]
    Empty,
    #[error("{features} feature rows but {targets} targets")]
    ShapeMismatch { features: usize, targets: usize },
    #[error("least-squares solve failed: {0}")]
    Solve(String),
    #[error("fitted weights are not finite")]
    NonFinite,
}

/// Ordinary least squares without intercept; the bias feature plays that role.
///
/// Solved through the SVD, so rank-deficient designs (fewer samples than
/// features, or a feature that never varies) give the minimum-norm solution
/// instead of an error.
pub fn fit_least_squares(
    features: &[BasisFunctions],
    targets: &[f64],
) -> Result<WeightVector, RegressionError> {
    let _timing = logging::start_timing(
        "fit_least_squares",
        OperationCategory::WeightsUpdate { subcategory: WeightsUpdateType::Regression },
    );

    if features.len() != targets.len() {
        return Err(RegressionError::ShapeMismatch {
            features: features.len(),
            targets: targets.len(),
        });
    }
    if features.is_empty() {
        return Err(RegressionError::Empty);
    }

    let rows: Vec<[f64; NUM_FEATURES]> = features.iter().map(BasisFunctions::to_array).collect();
    let design = DMatrix::from_fn(rows.len(), NUM_FEATURES, |i, j| rows[i][j]);
    let observed = DVector::from_column_slice(targets);

    let svd = design.svd(true, true);
    let largest = svd.singular_values.max();
    let tolerance = largest * f64::EPSILON * rows.len().max(NUM_FEATURES) as f64;

    let solution = svd
        .solve(&observed, tolerance)
        .map_err(|e| RegressionError::Solve(e.to_string()))?;

    let mut weights = [0.0; NUM_FEATURES];
    for (weight, value) in weights.iter_mut().zip(solution.iter()) {
        *weight = *value;
    }

    if weights.iter().all(|w| w.is_finite()) {
        Ok(weights)
    } else {
        Err(RegressionError::NonFinite)
    }
}
