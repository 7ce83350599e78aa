use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// On-disk record for one point cloud fragment.
///
/// A fragment file is a bincode-encoded record whose `pcd` field holds the
/// point coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct FragmentRecord {
    /// Point coordinates of the fragment.
    pub pcd: Vec<[f64; 3]>,
}

/// Read a fragment record from disk.
///
/// A missing or unreadable file fails immediately; there is no retry.
pub fn read_fragment(path: impl AsRef<Path>) -> Result<FragmentRecord, DataError> {
    let bytes = std::fs::read(path)?;
    let (record, _) = bincode::decode_from_slice(&bytes, bincode::config::standard())?;
    Ok(record)
}

/// Write a fragment record to disk.
pub fn write_fragment(path: impl AsRef<Path>, record: &FragmentRecord) -> Result<(), DataError> {
    let bytes = bincode::encode_to_vec(record, bincode::config::standard())?;
    std::fs::write(path, bytes)?;
    Ok(())
}
