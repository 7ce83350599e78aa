use pointpair_match::CorrespondenceSet;

use crate::dataset::PairSample;

/// A batch of paired samples concatenated along the point axis.
///
/// Voxel coordinates carry the sample ordinal as a leading batch tag, and
/// correspondence indices are offset by the cumulative point counts of the
/// two streams so they stay valid into the concatenated arrays. `sizes`
/// records the per-sample `(count0, count1)` pair for un-batching.
#[derive(Debug, Clone, Default)]
pub struct PairBatch {
    /// Concatenated points of fragment stream 0.
    pub points0: Vec<[f64; 3]>,
    /// Concatenated points of fragment stream 1.
    pub points1: Vec<[f64; 3]>,
    /// Batch-tagged voxel coordinates of stream 0: `[tag, x, y, z]`.
    pub coords0: Vec<[i32; 4]>,
    /// Batch-tagged voxel coordinates of stream 1: `[tag, x, y, z]`.
    pub coords1: Vec<[i32; 4]>,
    /// Concatenated features of stream 0.
    pub feats0: Vec<[f64; 3]>,
    /// Concatenated features of stream 1.
    pub feats1: Vec<[f64; 3]>,
    /// Offset correspondence pairs into the concatenated streams.
    pub correspondences: Vec<[u32; 2]>,
    /// One row-major 4x4 relative transform per sample.
    pub transforms: Vec<[[f64; 4]; 4]>,
    /// Per-sample `(count0, count1)` point counts, in sample order.
    pub sizes: Vec<(usize, usize)>,
}

impl PairBatch {
    /// Get the number of samples merged into the batch.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Check if the batch holds no samples.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

/// Merge paired samples into one concatenated batch.
///
/// Samples are laid out in input order. An empty correspondence set
/// contributes the single sentinel pair `(0, 0)` before offsetting, so
/// every sample lands at least one row in `correspondences`; downstream
/// consumers that require a non-empty relation per sample depend on this,
/// at the cost of a spurious match at each empty sample's base offset.
pub fn collate_pairs(samples: &[PairSample]) -> PairBatch {
    let mut batch = PairBatch::default();

    let mut offset0 = 0u32;
    let mut offset1 = 0u32;
    for (batch_id, sample) in samples.iter().enumerate() {
        let count0 = sample.points0.len();
        let count1 = sample.points1.len();

        batch.points0.extend_from_slice(&sample.points0);
        batch.points1.extend_from_slice(&sample.points1);
        batch.feats0.extend_from_slice(&sample.feats0);
        batch.feats1.extend_from_slice(&sample.feats1);

        // the batch tag moves to the front of each coordinate row
        let tag = batch_id as i32;
        batch
            .coords0
            .extend(sample.coords0.iter().map(|c| [tag, c[0], c[1], c[2]]));
        batch
            .coords1
            .extend(sample.coords1.iter().map(|c| [tag, c[0], c[1], c[2]]));

        match &sample.correspondences {
            CorrespondenceSet::Matched(pairs) => {
                batch
                    .correspondences
                    .extend(pairs.iter().map(|p| [p[0] + offset0, p[1] + offset1]));
            }
            CorrespondenceSet::Empty => {
                batch.correspondences.push([offset0, offset1]);
            }
        }

        batch.transforms.push(sample.transform.rows());
        batch.sizes.push((count0, count1));

        offset0 += count0 as u32;
        offset1 += count1 as u32;
    }

    batch
}
