use std::path::PathBuf;

use rand::Rng;

use pointpair_3d::pointcloud::PointCloud;
use pointpair_3d::transforms::{sample_random_transform, Transform};
use pointpair_3d::voxel::quantize;
use pointpair_match::{find_radius_correspondences, CorrespondenceSet};

use crate::config::{Config, DatasetKind, Phase};
use crate::error::DataError;
use crate::manifest::read_manifest;
use crate::storage::read_fragment;

/// Maximum number of retained points per fragment after quantization.
pub const MAX_FRAGMENT_POINTS: usize = 40_000;

// Fixed seed for the quantizer's subsampling step. Both fragments of a
// pair use the same seed so the size cap behaves identically for both.
const SUBSAMPLE_SEED: u64 = 42;

// Probability of drawing a scale augmentation when it is enabled.
const SCALE_AUGMENT_PROBABILITY: f64 = 0.95;

/// Hook for an external augmentation applied to (voxel coords, features)
/// pairs after quantization, independently per fragment.
pub trait PairTransform: Send + Sync {
    /// Mutate the voxel coordinates and feature vectors of one fragment.
    fn apply(&self, coords: &mut Vec<[i32; 3]>, feats: &mut Vec<[f64; 3]>);
}

/// One paired training example.
///
/// All per-point arrays are indexed by the post-quantization point order,
/// so correspondence indices are valid into `points0`/`points1` directly.
#[derive(Debug, Clone)]
pub struct PairSample {
    /// Points of fragment 0, post augmentation and quantization.
    pub points0: Vec<[f64; 3]>,
    /// Points of fragment 1, post augmentation and quantization.
    pub points1: Vec<[f64; 3]>,
    /// Voxel coordinates of fragment 0.
    pub coords0: Vec<[i32; 3]>,
    /// Voxel coordinates of fragment 1.
    pub coords1: Vec<[i32; 3]>,
    /// Feature vectors of fragment 0.
    pub feats0: Vec<[f64; 3]>,
    /// Feature vectors of fragment 1.
    pub feats1: Vec<[f64; 3]>,
    /// Point-index pairs between the two fragments.
    pub correspondences: CorrespondenceSet,
    /// Ground-truth transform from fragment 0's pose to fragment 1's pose.
    pub transform: Transform,
}

/// Paired ScanNet fragments listed in a two-column manifest.
///
/// Each item loads two partially-overlapping fragments, applies randomized
/// scale/rotation augmentation, voxelizes both clouds and computes the
/// radius correspondences under the ground-truth relative transform.
pub struct ScanNetMatchPairDataset {
    root: PathBuf,
    files: Vec<(String, String)>,
    voxel_size: f64,
    matching_search_voxel_size: f64,
    random_rotation: bool,
    rotation_range: f64,
    random_scale: bool,
    min_scale: f64,
    max_scale: f64,
    jitter: Option<Box<dyn PairTransform>>,
}

impl ScanNetMatchPairDataset {
    /// Open the dataset for the given phase.
    ///
    /// Fails fast at construction for any phase other than
    /// [`Phase::Train`], and when the manifest cannot be read.
    pub fn new(
        phase: Phase,
        config: &Config,
        jitter: Option<Box<dyn PairTransform>>,
    ) -> Result<Self, DataError> {
        match config.data.dataset {
            DatasetKind::ScanNetMatchPair => {}
        }
        if phase != Phase::Train {
            return Err(DataError::UnsupportedPhase(phase));
        }

        let root = config.data.dataset_root_dir.clone();
        let manifest_path = root.join(&config.data.match_filelist);
        log::info!(
            "loading the {} split from {}",
            phase,
            manifest_path.display()
        );
        let files = read_manifest(&manifest_path)?;
        log::info!("found {} fragment pairs", files.len());

        Ok(Self {
            root,
            files,
            voxel_size: config.data.voxel_size,
            matching_search_voxel_size: config.data.voxel_size
                * config.trainer.positive_pair_search_voxel_size_multiplier,
            random_rotation: config.trainer.use_random_rotation,
            rotation_range: config.trainer.rotation_range,
            random_scale: config.trainer.use_random_scale,
            min_scale: config.trainer.min_scale,
            max_scale: config.trainer.max_scale,
            jitter,
        })
    }

    /// Get the number of fragment pairs.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the manifest listed no pairs.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Build the paired sample for one dataset item.
    ///
    /// `rng` drives the augmentation draws and is expected to be a
    /// worker-local generator seeded deterministically per item.
    pub fn get_pair(&self, index: usize, rng: &mut impl Rng) -> Result<PairSample, DataError> {
        let (file0, file1) = self.files.get(index).ok_or(DataError::ItemOutOfRange {
            index,
            len: self.files.len(),
        })?;

        let mut cloud0 = PointCloud::with_unit_colors(read_fragment(self.root.join(file0))?.pcd);
        let mut cloud1 = PointCloud::with_unit_colors(read_fragment(self.root.join(file1))?.pcd);

        // one scale draw for both fragments; the search radius scales with
        // the geometry so matches survive the augmentation
        let mut search_radius = self.matching_search_voxel_size;
        if self.random_scale && rng.random::<f64>() < SCALE_AUGMENT_PROBABILITY {
            let scale = self.min_scale + (self.max_scale - self.min_scale) * rng.random::<f64>();
            search_radius *= scale;
            for point in cloud0.points_mut().iter_mut().chain(cloud1.points_mut()) {
                point[0] *= scale;
                point[1] *= scale;
                point[2] *= scale;
            }
        }

        let transform = if self.random_rotation {
            let t0 =
                sample_random_transform(cloud0.points(), rng, self.rotation_range, None, None)?;
            let t1 =
                sample_random_transform(cloud1.points(), rng, self.rotation_range, None, None)?;
            t0.transform_points_inplace(cloud0.points_mut());
            t1.transform_points_inplace(cloud1.points_mut());
            // maps fragment 0 in its new pose onto fragment 1 in its new pose
            t1.compose(&t0.inverse())
        } else {
            Transform::identity()
        };

        let quantized0 = quantize(
            cloud0.points(),
            self.voxel_size,
            Some(MAX_FRAGMENT_POINTS),
            SUBSAMPLE_SEED,
        )?;
        let quantized1 = quantize(
            cloud1.points(),
            self.voxel_size,
            Some(MAX_FRAGMENT_POINTS),
            SUBSAMPLE_SEED,
        )?;

        let selected0 = cloud0.select(&quantized0.indices);
        let selected1 = cloud1.select(&quantized1.indices);
        let points0 = selected0.points().to_vec();
        let points1 = selected1.points().to_vec();

        let correspondences = find_radius_correspondences(
            &points0,
            &points1,
            &transform,
            search_radius,
            None,
        );
        log::debug!(
            "item {index}: {}x{} points, {} correspondences",
            points0.len(),
            points1.len(),
            correspondences.len()
        );

        let mut coords0 = quantized0.coords;
        let mut coords1 = quantized1.coords;
        let mut feats0 = vec![[1.0; 3]; points0.len()];
        let mut feats1 = vec![[1.0; 3]; points1.len()];

        if let Some(jitter) = &self.jitter {
            jitter.apply(&mut coords0, &mut feats0);
            jitter.apply(&mut coords1, &mut feats1);
        }

        // each point's feature is its own spatial coordinate vector; this
        // replaces the placeholder features wholesale, including anything
        // the jitter hook did to them
        let feats0 = points0.clone();
        let feats1 = points1.clone();

        Ok(PairSample {
            points0,
            points1,
            coords0,
            coords1,
            feats0,
            feats1,
            correspondences,
            transform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataConfig, MiscConfig, TrainerConfig};
    use crate::storage::{write_fragment, FragmentRecord};
    use rand::{rngs::StdRng, SeedableRng};

    fn write_pair_fixture(
        dir: &std::path::Path,
        points: &[[f64; 3]],
    ) -> Result<(), DataError> {
        let record = FragmentRecord {
            pcd: points.to_vec(),
        };
        write_fragment(dir.join("frag_000.bin"), &record)?;
        write_fragment(dir.join("frag_001.bin"), &record)?;
        std::fs::write(dir.join("pairs.txt"), "frag_000.bin frag_001.bin\n")?;
        Ok(())
    }

    fn test_config(root: &std::path::Path) -> Config {
        Config {
            data: DataConfig {
                dataset: DatasetKind::ScanNetMatchPair,
                voxel_size: 0.05,
                dataset_root_dir: root.to_path_buf(),
                match_filelist: "pairs.txt".into(),
            },
            trainer: TrainerConfig {
                positive_pair_search_voxel_size_multiplier: 1.0,
                min_scale: 0.8,
                max_scale: 1.2,
                rotation_range: 360.0,
                use_random_rotation: false,
                use_random_scale: false,
                batch_size: 1,
            },
            misc: MiscConfig {
                num_gpus: 1,
                num_threads: 0,
                seed: 0,
            },
        }
    }

    fn grid_points(n: usize) -> Vec<[f64; 3]> {
        (0..n).map(|i| [i as f64 * 0.3, 0.0, 0.0]).collect()
    }

    #[test]
    fn test_non_train_phase_fails_at_construction() -> Result<(), DataError> {
        let dir = tempfile::tempdir()?;
        write_pair_fixture(dir.path(), &grid_points(10))?;
        let config = test_config(dir.path());

        let result = ScanNetMatchPairDataset::new(Phase::Val, &config, None);
        assert!(matches!(result, Err(DataError::UnsupportedPhase(_))));
        Ok(())
    }

    #[test]
    fn test_identical_clouds_without_augmentation() -> Result<(), DataError> {
        let dir = tempfile::tempdir()?;
        write_pair_fixture(dir.path(), &grid_points(100))?;
        let config = test_config(dir.path());

        let dataset = ScanNetMatchPairDataset::new(Phase::Train, &config, None)?;
        assert_eq!(dataset.len(), 1);

        let mut rng = StdRng::seed_from_u64(0);
        let sample = dataset.get_pair(0, &mut rng)?;

        // no augmentation: the relative transform is the identity
        assert_eq!(sample.transform.rows(), Transform::identity().rows());

        // identical clouds: every self-match is present
        assert_eq!(sample.points0.len(), 100);
        assert_eq!(sample.points1.len(), 100);
        assert!(!sample.correspondences.is_empty());
        let pairs: std::collections::HashSet<_> =
            sample.correspondences.pairs().iter().copied().collect();
        for i in 0..100u32 {
            assert!(pairs.contains(&[i, i]), "missing self match for {i}");
        }

        // features are the point coordinates
        assert_eq!(sample.feats0, sample.points0);
        assert_eq!(sample.feats1, sample.points1);

        // voxel coordinates are non-negative and aligned with the points
        assert_eq!(sample.coords0.len(), sample.points0.len());
        for coord in &sample.coords0 {
            assert!(coord.iter().all(|&c| c >= 0));
        }
        Ok(())
    }

    #[test]
    fn test_rotation_augmentation_keeps_self_matches() -> Result<(), DataError> {
        let dir = tempfile::tempdir()?;
        write_pair_fixture(dir.path(), &grid_points(50))?;
        let mut config = test_config(dir.path());
        config.trainer.use_random_rotation = true;

        let dataset = ScanNetMatchPairDataset::new(Phase::Train, &config, None)?;
        let mut rng = StdRng::seed_from_u64(7);
        let sample = dataset.get_pair(0, &mut rng)?;

        // the relative transform undoes pose 0 and applies pose 1, so the
        // identical underlying geometry still matches point for point
        let pairs: std::collections::HashSet<_> =
            sample.correspondences.pairs().iter().copied().collect();
        for i in 0..sample.points0.len() as u32 {
            assert!(pairs.contains(&[i, i]), "missing self match for {i}");
        }
        Ok(())
    }

    #[test]
    fn test_augmentation_is_reproducible_per_seed() -> Result<(), DataError> {
        let dir = tempfile::tempdir()?;
        write_pair_fixture(dir.path(), &grid_points(50))?;
        let mut config = test_config(dir.path());
        config.trainer.use_random_rotation = true;
        config.trainer.use_random_scale = true;

        let dataset = ScanNetMatchPairDataset::new(Phase::Train, &config, None)?;

        let mut rng_a = StdRng::seed_from_u64(13);
        let mut rng_b = StdRng::seed_from_u64(13);
        let a = dataset.get_pair(0, &mut rng_a)?;
        let b = dataset.get_pair(0, &mut rng_b)?;

        assert_eq!(a.points0, b.points0);
        assert_eq!(a.coords1, b.coords1);
        assert_eq!(a.correspondences, b.correspondences);
        assert_eq!(a.transform.rows(), b.transform.rows());
        Ok(())
    }

    #[test]
    fn test_item_out_of_range() -> Result<(), DataError> {
        let dir = tempfile::tempdir()?;
        write_pair_fixture(dir.path(), &grid_points(10))?;
        let config = test_config(dir.path());

        let dataset = ScanNetMatchPairDataset::new(Phase::Train, &config, None)?;
        let mut rng = StdRng::seed_from_u64(0);
        let result = dataset.get_pair(5, &mut rng);
        assert!(matches!(
            result,
            Err(DataError::ItemOutOfRange { index: 5, len: 1 })
        ));
        Ok(())
    }

    #[test]
    fn test_missing_fragment_fails_item() -> Result<(), DataError> {
        let dir = tempfile::tempdir()?;
        write_pair_fixture(dir.path(), &grid_points(10))?;
        std::fs::remove_file(dir.path().join("frag_001.bin"))?;
        let config = test_config(dir.path());

        let dataset = ScanNetMatchPairDataset::new(Phase::Train, &config, None)?;
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            dataset.get_pair(0, &mut rng),
            Err(DataError::Io(_))
        ));
        Ok(())
    }
}
