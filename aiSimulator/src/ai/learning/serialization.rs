//! On-disk record shapes for the learning state.

use serde::{Serialize, Deserialize};

use crate::ai::learning::weights::{TrainingState, WeightVector};

/// Consolidated state file body (stored gzip-compressed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableTrainingState {
    pub iteration: u64,
    pub zetas: WeightVector,
    pub history: Vec<WeightVector>,
}

/// One rotating snapshot; weights only, no history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub iteration: u64,
    pub zetas: WeightVector,
}

/// Single-document checkpoint written by older releases. Read only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyCheckpoint {
    pub iteration: u64,
    pub zetas: WeightVector,
    #[serde(default)]
    pub history: Option<Vec<WeightVector>>,
}

impl From<&TrainingState> for SerializableTrainingState {
    fn from(state: &TrainingState) -> Self {
        Self {
            iteration: state.iteration,
            zetas: state.zetas,
            history: state.history.clone(),
        }
    }
}

impl From<SerializableTrainingState> for TrainingState {
    fn from(record: SerializableTrainingState) -> Self {
        TrainingState {
            iteration: record.iteration,
            zetas: record.zetas,
            history: record.history,
        }
    }
}

impl From<LegacyCheckpoint> for TrainingState {
    fn from(record: LegacyCheckpoint) -> Self {
        // An absent or empty history starts from the stored weights
        let history = match record.history {
            Some(history) if !history.is_empty() => history,
            _ => vec![record.zetas],
        };
        TrainingState {
            iteration: record.iteration,
            zetas: record.zetas,
            history,
        }
    }
}
