use rand::{rngs::StdRng, SeedableRng};
use std::collections::HashSet;

/// Error types for the voxel module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum VoxelError {
    /// The voxel size is non-positive or non-finite.
    #[error("voxel size must be positive and finite, got {0}")]
    InvalidVoxelSize(f64),
}

/// Result of quantizing a point cloud onto a voxel grid.
///
/// `coords` and `indices` are parallel arrays: `coords[i]` is the voxel
/// coordinate of the original point `points[indices[i]]`. Callers re-index
/// points, colors and features by the same `indices` list so all
/// per-point arrays stay consistent.
#[derive(Debug, Clone)]
pub struct QuantizedCloud {
    /// Non-negative integer voxel coordinates, one per retained point.
    pub coords: Vec<[i32; 3]>,
    /// Indices of the retained points into the original point array.
    pub indices: Vec<usize>,
}

impl QuantizedCloud {
    /// Get the number of retained points.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check if no points were retained.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Quantize a point cloud onto a regular voxel grid.
///
/// Each point is mapped to `round(point / voxel_size)` and the per-cloud
/// minimum is subtracted along each axis so coordinates are non-negative.
/// One representative point is retained per occupied voxel: the first
/// occurrence under input array order, which makes the result
/// deterministic for a fixed input order.
///
/// When more voxels are occupied than `max_points`, the retained set is
/// subsampled without replacement down to exactly `max_points` using a
/// generator built from `subsample_seed` for this call only. The outcome
/// depends only on the candidate count and the seed, never on call order,
/// so concurrent quantization calls stay reproducible.
///
/// An empty input yields an empty result.
///
/// # Errors
///
/// Returns [`VoxelError::InvalidVoxelSize`] when `voxel_size` is
/// non-positive or non-finite.
pub fn quantize(
    points: &[[f64; 3]],
    voxel_size: f64,
    max_points: Option<usize>,
    subsample_seed: u64,
) -> Result<QuantizedCloud, VoxelError> {
    if voxel_size <= 0.0 || !voxel_size.is_finite() {
        return Err(VoxelError::InvalidVoxelSize(voxel_size));
    }
    if points.is_empty() {
        return Ok(QuantizedCloud {
            coords: Vec::new(),
            indices: Vec::new(),
        });
    }

    // snap every point to the grid
    let mut grid_coords = Vec::with_capacity(points.len());
    let mut min = [i32::MAX; 3];
    for point in points {
        let coord = [
            (point[0] / voxel_size).round() as i32,
            (point[1] / voxel_size).round() as i32,
            (point[2] / voxel_size).round() as i32,
        ];
        for axis in 0..3 {
            min[axis] = min[axis].min(coord[axis]);
        }
        grid_coords.push(coord);
    }

    // shift by the per-cloud minimum so coordinates are non-negative,
    // then keep the first point seen per occupied voxel
    let mut occupied = HashSet::with_capacity(points.len());
    let mut coords = Vec::new();
    let mut indices = Vec::new();
    for (i, coord) in grid_coords.iter().enumerate() {
        let shifted = [
            coord[0] - min[0],
            coord[1] - min[1],
            coord[2] - min[2],
        ];
        if occupied.insert(shifted) {
            coords.push(shifted);
            indices.push(i);
        }
    }

    if let Some(max_points) = max_points {
        if indices.len() > max_points {
            let mut rng = StdRng::seed_from_u64(subsample_seed);
            let picked = rand::seq::index::sample(&mut rng, indices.len(), max_points);
            let mut sub_coords = Vec::with_capacity(max_points);
            let mut sub_indices = Vec::with_capacity(max_points);
            for pos in picked.iter() {
                sub_coords.push(coords[pos]);
                sub_indices.push(indices[pos]);
            }
            coords = sub_coords;
            indices = sub_indices;
        }
    }

    Ok(QuantizedCloud { coords, indices })
}
