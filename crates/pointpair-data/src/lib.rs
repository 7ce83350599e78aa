#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Configuration surface for the pairing pipeline.
pub mod config;

/// Batch collation of variable-size paired samples.
pub mod collate;

/// Paired fragment dataset.
pub mod dataset;

/// Error types for the data pipeline.
pub mod error;

/// Batched data loading.
pub mod loader;

/// Manifest (filelist) parsing.
pub mod manifest;

/// On-disk fragment records.
pub mod storage;
