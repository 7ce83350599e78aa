use crate::config::Phase;
use pointpair_3d::{transforms::TransformError, voxel::VoxelError};

/// Error types for the data pipeline.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DataError {
    /// The requested dataset phase is not supported.
    #[error("unsupported dataset phase: {0}")]
    UnsupportedPhase(Phase),

    /// The batch size cannot be partitioned over the configured devices.
    #[error("global batch size {batch_size} cannot be split over {num_gpus} device(s)")]
    InvalidBatchSize {
        /// Configured global batch size.
        batch_size: usize,
        /// Configured device count.
        num_gpus: usize,
    },

    /// A manifest line does not hold two whitespace-separated paths.
    #[error("malformed manifest line {line}: expected two columns")]
    MalformedManifest {
        /// One-based line number.
        line: usize,
    },

    /// The dataset item index is out of range.
    #[error("item index {index} out of range for {len} items")]
    ItemOutOfRange {
        /// Requested index.
        index: usize,
        /// Dataset length.
        len: usize,
    },

    /// Failed to read a file.
    #[error("failed to read file")]
    Io(#[from] std::io::Error),

    /// Failed to decode a fragment record.
    #[error("failed to decode fragment record")]
    Decode(#[from] bincode::error::DecodeError),

    /// Failed to encode a fragment record.
    #[error("failed to encode fragment record")]
    Encode(#[from] bincode::error::EncodeError),

    /// Failed to parse a configuration file.
    #[error("failed to parse configuration")]
    Config(#[from] serde_json::Error),

    /// A geometric operation degenerated while building a sample.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Voxel quantization failed.
    #[error(transparent)]
    Voxel(#[from] VoxelError),

    /// The worker thread pool could not be built.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}
