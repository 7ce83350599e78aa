use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::DataError;

/// Read a pair manifest: one fragment pair per line, two relative paths
/// separated by whitespace. Blank lines are skipped.
pub fn read_manifest(path: impl AsRef<Path>) -> Result<Vec<(String, String)>, DataError> {
    let reader = BufReader::new(std::fs::File::open(path)?);

    let mut pairs = Vec::new();
    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let mut columns = line.split_whitespace();
        match (columns.next(), columns.next()) {
            (Some(first), Some(second)) => pairs.push((first.to_string(), second.to_string())),
            (Some(_), None) => {
                return Err(DataError::MalformedManifest { line: line_idx + 1 });
            }
            (None, _) => continue,
        }
    }
    Ok(pairs)
}
