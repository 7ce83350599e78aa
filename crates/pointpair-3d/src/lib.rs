#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Point cloud container.
pub mod pointcloud;

/// Homogeneous transforms and random transform sampling.
pub mod transforms;

/// Voxel grid quantization and subsampling.
pub mod voxel;
