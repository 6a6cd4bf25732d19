// AI module structure for the ADP charging simulator
// Organized in sub-modules for better maintainability

// Features module - basis functions of the value-function approximation
pub mod features {
    pub mod basis;
}

// Decision module - per-step charging decisions (MILP and greedy baselines)
pub mod decision {
    pub mod milp;
    pub mod model;
    pub mod heuristics;
}

// Metrics module - per-day simulation results
pub mod metrics {
    pub mod simulation_metrics;
}

// Learning module - value-function weights, regression and persistence
pub mod learning {
    pub mod weights;
    pub mod serialization;
}

// Re-export common types for convenience
pub use decision::model::{decide, Assignment, Decision, DecisionError};
pub use decision::milp::{GoodLpSolver, MilpSolver, SolverError};
pub use decision::heuristics::{solve_heuristic, HeuristicRule};
pub use features::basis::{extract_features, BasisFunctions};
pub use learning::weights::{CheckpointStore, TrainingState, WeightVector};
pub use metrics::simulation_metrics::DayResult;
