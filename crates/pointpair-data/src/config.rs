use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::DataError;

/// Supported dataset kinds, resolved at configuration parse time.
///
/// A closed enum instead of a runtime string lookup: unknown kinds fail
/// during deserialization, before any item is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DatasetKind {
    /// Paired ScanNet fragments listed in a two-column manifest.
    ScanNetMatchPair,
}

/// Dataset split to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Phase {
    /// Training split. The only supported phase.
    Train,
    /// Validation split.
    Val,
    /// Test split.
    Test,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Train => write!(f, "train"),
            Phase::Val => write!(f, "val"),
            Phase::Test => write!(f, "test"),
        }
    }
}

/// Dataset location and voxelization settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Which dataset to load.
    pub dataset: DatasetKind,
    /// Voxel (leaf) size in world units.
    pub voxel_size: f64,
    /// Root directory holding fragment files and the manifest.
    pub dataset_root_dir: PathBuf,
    /// Manifest path relative to `dataset_root_dir`, one fragment pair per
    /// line, columns whitespace-separated.
    pub match_filelist: PathBuf,
}

/// Augmentation and batching settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainerConfig {
    /// Search radius = `voxel_size * positive_pair_search_voxel_size_multiplier`.
    pub positive_pair_search_voxel_size_multiplier: f64,
    /// Lower bound of the random scale augmentation.
    pub min_scale: f64,
    /// Upper bound of the random scale augmentation.
    pub max_scale: f64,
    /// Rotation augmentation range in degrees.
    pub rotation_range: f64,
    /// Whether to apply random rotation augmentation.
    pub use_random_rotation: bool,
    /// Whether to apply random scale augmentation.
    pub use_random_scale: bool,
    /// Global batch size, partitioned across devices.
    pub batch_size: usize,
}

/// Process-level settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MiscConfig {
    /// Number of devices the global batch size is partitioned over.
    pub num_gpus: usize,
    /// Worker parallelism degree for per-item construction (0 = build
    /// items on the calling thread).
    pub num_threads: usize,
    /// Base seed for epoch shuffling and per-item augmentation draws.
    pub seed: u64,
}

/// Top-level configuration for the pairing pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Dataset settings.
    pub data: DataConfig,
    /// Trainer settings.
    pub trainer: TrainerConfig,
    /// Process settings.
    pub misc: MiscConfig,
}

impl Config {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
