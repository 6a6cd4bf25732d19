// Main module declarations for the ADP charging simulator

// Core simulation modules
pub mod core {
    pub mod simulation;
    pub mod multi_simulation;
    pub mod iteration;
    pub mod actions;
}

// AI components: features, decision models and value-function learning
pub mod ai;

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod const_funcs;
    pub mod simulation_config;
}

// Model definitions
pub mod models {
    pub mod ev;
    pub mod charger;
}

// Scenario data
pub mod data {
    pub mod scenario;
}

// Analysis and reporting
pub mod analysis {
    pub mod metrics_calculation;
    pub mod reporting;
}

// Utility functions
pub mod utils {
    pub mod logging;
    pub mod csv_export;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

// Re-export commonly used modules
pub use crate::core::simulation;
pub use crate::core::multi_simulation;
pub use crate::models::charger::Charger;
pub use crate::models::ev::Ev;
