//! Durable storage for TrainingState
//!
//! Three on-disk shapes are understood:
//! * the consolidated state file (`training_state.json.gz`), gzip-compressed
//!   JSON holding iteration, weights and the full history;
//! * rotating per-checkpoint snapshots (`checkpoint_00000500.json`), weights
//!   only, pruned to a retention count;
//! * a single legacy JSON document, migrated on first load and then removed.
//!
//! Every write goes to a temporary file that is renamed over the target, so
//! an interrupted write never leaves a truncated checkpoint behind. Files that
//! cannot be read are renamed with a `.corrupted` suffix and treated as absent.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ai::learning::serialization::{LegacyCheckpoint, SerializableTrainingState, SnapshotRecord};
use crate::config::constants::{
    CORRUPTED_SUFFIX, SNAPSHOT_EXTENSION, SNAPSHOT_PREFIX, STATE_FILE_NAME, STATE_TMP_FILE_NAME,
};
use crate::config::simulation_config::CheckpointConfig;
use crate::utils::logging::{self, FileIOType, OperationCategory};
use super::{TrainingState, WeightVector};

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O failed on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("checkpoint {} could not be encoded or decoded: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CheckpointError + '_ {
    move |source| CheckpointError::Io { path: path.to_path_buf(), source }
}

fn format_error(path: &Path) -> impl FnOnce(serde_json::Error) -> CheckpointError + '_ {
    move |source| CheckpointError::Format { path: path.to_path_buf(), source }
}

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    directory: PathBuf,
    legacy_file: PathBuf,
    max_files: usize,
}

impl CheckpointStore {
    pub fn new(directory: impl Into<PathBuf>, legacy_file: impl Into<PathBuf>, max_files: usize) -> Self {
        Self {
            directory: directory.into(),
            legacy_file: legacy_file.into(),
            max_files: max_files.max(1),
        }
    }

    pub fn from_config(config: &CheckpointConfig) -> Self {
        Self::new(&config.directory, &config.legacy_file, config.max_files)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn state_path(&self) -> PathBuf {
        self.directory.join(STATE_FILE_NAME)
    }

    pub fn snapshot_path(&self, iteration: u64) -> PathBuf {
        self.directory
            .join(format!("{}{:08}{}", SNAPSHOT_PREFIX, iteration, SNAPSHOT_EXTENSION))
    }

    /// Recovers the latest training state, or `None` when nothing usable exists.
    ///
    /// Sources are tried in order: state file, legacy checkpoint, snapshots.
    /// A state rebuilt from the latter two is written back as a state file.
    pub fn load(&self) -> Result<Option<TrainingState>, CheckpointError> {
        let _timing = logging::start_timing(
            "load_checkpoint",
            OperationCategory::FileIO { subcategory: FileIOType::CheckpointLoad },
        );

        if let Some(state) = self.load_state_file()? {
            info!(iteration = state.iteration, "loaded training state from {}", self.state_path().display());
            return Ok(Some(state));
        }

        if let Some(state) = self.load_legacy()? {
            info!(iteration = state.iteration, "migrated legacy checkpoint {}", self.legacy_file.display());
            return Ok(Some(state));
        }

        let state = self.load_snapshots()?;
        if let Some(state) = &state {
            info!(
                iteration = state.iteration,
                snapshots = state.history.len(),
                "rebuilt training state from snapshots"
            );
        }
        Ok(state)
    }

    /// Periodic checkpoint: a rotating snapshot plus the consolidated state.
    pub fn save(&self, state: &TrainingState) -> Result<(), CheckpointError> {
        let _timing = logging::start_timing(
            "save_checkpoint",
            OperationCategory::FileIO { subcategory: FileIOType::CheckpointSave },
        );

        self.save_snapshot(state.iteration, &state.zetas)?;
        self.save_state(state)?;
        Ok(())
    }

    /// Atomically replaces the state file. Returns false, writing nothing,
    /// when the history is still empty.
    pub fn save_state(&self, state: &TrainingState) -> Result<bool, CheckpointError> {
        if state.history.is_empty() {
            debug!("empty weight history, state file not written");
            return Ok(false);
        }

        self.ensure_directory()?;
        let target = self.state_path();
        let record = SerializableTrainingState::from(state);

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        serde_json::to_writer(&mut encoder, &record).map_err(format_error(&target))?;
        let bytes = encoder.finish().map_err(io_error(&target))?;

        write_atomically(&self.directory.join(STATE_TMP_FILE_NAME), &target, &bytes)?;
        debug!(iteration = state.iteration, rows = state.history.len(), "state file written");
        Ok(true)
    }

    /// Writes `checkpoint_<iteration>.json`, drops any legacy checkpoint and
    /// prunes the oldest snapshots beyond the retention count.
    pub fn save_snapshot(&self, iteration: u64, zetas: &WeightVector) -> Result<PathBuf, CheckpointError> {
        self.ensure_directory()?;

        if self.legacy_file.is_file() {
            fs::remove_file(&self.legacy_file).map_err(io_error(&self.legacy_file))?;
        }

        let target = self.snapshot_path(iteration);
        let record = SnapshotRecord { iteration, zetas: *zetas };
        let bytes = serde_json::to_vec(&record).map_err(format_error(&target))?;
        write_atomically(&with_suffix(&target, ".tmp"), &target, &bytes)?;

        self.prune_snapshots()?;
        Ok(target)
    }

    /// Snapshot files in name order, which is iteration order.
    pub fn snapshot_files(&self) -> Result<Vec<PathBuf>, CheckpointError> {
        if !self.directory.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.directory).map_err(io_error(&self.directory))? {
            let entry = entry.map_err(io_error(&self.directory))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(SNAPSHOT_PREFIX) && name.ends_with(SNAPSHOT_EXTENSION) {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Removes the state file, every snapshot and the legacy checkpoint.
    /// Quarantined `.corrupted` files are left in place.
    pub fn clear(&self) -> Result<usize, CheckpointError> {
        let mut targets = self.snapshot_files()?;
        targets.push(self.state_path());
        targets.push(self.legacy_file.clone());

        let mut removed = 0;
        for path in targets.iter().filter(|path| path.is_file()) {
            fs::remove_file(path).map_err(io_error(path))?;
            removed += 1;
        }
        info!(removed, "cleared checkpoints in {}", self.directory.display());
        Ok(removed)
    }

    fn prune_snapshots(&self) -> Result<(), CheckpointError> {
        let files = self.snapshot_files()?;
        let excess = files.len().saturating_sub(self.max_files);
        for path in files.iter().take(excess) {
            fs::remove_file(path).map_err(io_error(path))?;
            debug!("pruned snapshot {}", path.display());
        }
        Ok(())
    }

    fn load_state_file(&self) -> Result<Option<TrainingState>, CheckpointError> {
        let path = self.state_path();
        if !path.is_file() {
            return Ok(None);
        }

        match read_gzip_json::<SerializableTrainingState>(&path) {
            Ok(record) => Ok(Some(TrainingState::from(record))),
            Err(e) => {
                quarantine(&path, &e)?;
                Ok(None)
            }
        }
    }

    fn load_legacy(&self) -> Result<Option<TrainingState>, CheckpointError> {
        if !self.legacy_file.is_file() {
            return Ok(None);
        }

        let record = match read_json::<LegacyCheckpoint>(&self.legacy_file) {
            Ok(record) => record,
            Err(e) => {
                quarantine(&self.legacy_file, &e)?;
                return Ok(None);
            }
        };

        let state = TrainingState::from(record);
        // Snapshot first: it also removes the legacy file
        self.save_snapshot(state.iteration, &state.zetas)?;
        self.save_state(&state)?;
        if self.legacy_file.is_file() {
            fs::remove_file(&self.legacy_file).map_err(io_error(&self.legacy_file))?;
        }
        Ok(Some(state))
    }

    fn load_snapshots(&self) -> Result<Option<TrainingState>, CheckpointError> {
        let mut history = Vec::new();
        let mut latest: Option<SnapshotRecord> = None;

        for path in self.snapshot_files()? {
            let record = match read_json::<SnapshotRecord>(&path) {
                Ok(record) => record,
                Err(e) => {
                    quarantine(&path, &e)?;
                    continue;
                }
            };
            history.push(record.zetas);
            if latest.as_ref().map_or(true, |best| record.iteration > best.iteration) {
                latest = Some(record);
            }
        }

        let Some(latest) = latest else {
            return Ok(None);
        };

        let state = TrainingState {
            iteration: latest.iteration,
            zetas: latest.zetas,
            history,
        };
        self.save_state(&state)?;
        Ok(Some(state))
    }

    fn ensure_directory(&self) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.directory).map_err(io_error(&self.directory))
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn write_atomically(tmp: &Path, target: &Path, bytes: &[u8]) -> Result<(), CheckpointError> {
    let mut file = File::create(tmp).map_err(io_error(tmp))?;
    file.write_all(bytes).map_err(io_error(tmp))?;
    file.sync_all().map_err(io_error(tmp))?;
    drop(file);
    fs::rename(tmp, target).map_err(io_error(target))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CheckpointError> {
    let bytes = fs::read(path).map_err(io_error(path))?;
    serde_json::from_slice(&bytes).map_err(format_error(path))
}

fn read_gzip_json<T: DeserializeOwned>(path: &Path) -> Result<T, CheckpointError> {
    let compressed = fs::read(path).map_err(io_error(path))?;
    let mut json = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut json)
        .map_err(io_error(path))?;
    serde_json::from_slice(&json).map_err(format_error(path))
}

/// Moves an unreadable file aside as `<name>.corrupted`.
fn quarantine(path: &Path, cause: &CheckpointError) -> Result<PathBuf, CheckpointError> {
    let corrupted = with_suffix(path, CORRUPTED_SUFFIX);
    fs::rename(path, &corrupted).map_err(io_error(path))?;
    warn!(error = %cause, "corrupted checkpoint moved to {}", corrupted.display());
    Ok(corrupted)
}
