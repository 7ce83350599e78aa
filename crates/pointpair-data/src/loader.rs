use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::collate::{collate_pairs, PairBatch};
use crate::config::{Config, Phase};
use crate::dataset::{PairTransform, ScanNetMatchPairDataset};
use crate::error::DataError;

// Mixes the item index into the base seed so every item draws from its
// own deterministic stream, independent of worker scheduling.
fn item_seed(base: u64, index: usize) -> u64 {
    base ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Iterator over collated pair batches for one epoch.
///
/// Item order is shuffled with a seeded generator, per-item augmentation
/// uses a worker-local generator derived from the base seed and the item
/// index, and trailing partial batches are dropped.
pub struct PairLoader {
    dataset: ScanNetMatchPairDataset,
    order: Vec<usize>,
    cursor: usize,
    batch_size: usize,
    pool: Option<rayon::ThreadPool>,
    seed: u64,
}

/// Build a [`PairLoader`] from the configuration.
///
/// The global batch size is partitioned over `num_gpus`; per-item
/// construction runs on a local worker pool of `num_threads` threads
/// (0 runs items on the calling thread).
pub fn make_data_loader(
    config: &Config,
    phase: Phase,
    jitter: Option<Box<dyn PairTransform>>,
) -> Result<PairLoader, DataError> {
    let dataset = ScanNetMatchPairDataset::new(phase, config, jitter)?;

    let num_gpus = config.misc.num_gpus;
    let batch_size = match num_gpus {
        0 => 0,
        _ => config.trainer.batch_size / num_gpus,
    };
    if batch_size == 0 {
        return Err(DataError::InvalidBatchSize {
            batch_size: config.trainer.batch_size,
            num_gpus,
        });
    }

    let pool = match config.misc.num_threads {
        0 => None,
        num_threads => Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build()
                .map_err(|e| DataError::WorkerPool(e.to_string()))?,
        ),
    };
    log::info!(
        "data loader: {} items, batch size {}, {} worker thread(s)",
        dataset.len(),
        batch_size,
        config.misc.num_threads
    );

    let mut loader = PairLoader {
        dataset,
        order: Vec::new(),
        cursor: 0,
        batch_size,
        pool,
        seed: config.misc.seed,
    };
    loader.reshuffle(config.misc.seed);
    Ok(loader)
}

impl PairLoader {
    /// Restart the epoch with a freshly shuffled item order.
    pub fn reshuffle(&mut self, seed: u64) {
        self.seed = seed;
        self.order = (0..self.dataset.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        self.order.shuffle(&mut rng);
        self.cursor = 0;
    }

    /// Get the per-device batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Get the number of full batches in one epoch.
    pub fn num_batches(&self) -> usize {
        self.dataset.len() / self.batch_size
    }

    /// Get the underlying dataset.
    pub fn dataset(&self) -> &ScanNetMatchPairDataset {
        &self.dataset
    }

    fn build_batch(&self, indices: &[usize]) -> Result<PairBatch, DataError> {
        let build_item = |&index: &usize| {
            let mut rng = StdRng::seed_from_u64(item_seed(self.seed, index));
            self.dataset.get_pair(index, &mut rng)
        };

        let samples: Result<Vec<_>, DataError> = match &self.pool {
            Some(pool) => pool.install(|| indices.par_iter().map(build_item).collect()),
            None => indices.iter().map(build_item).collect(),
        };

        Ok(collate_pairs(&samples?))
    }
}

impl Iterator for PairLoader {
    type Item = Result<PairBatch, DataError>;

    fn next(&mut self) -> Option<Self::Item> {
        // partial trailing batches are dropped
        if self.cursor + self.batch_size > self.order.len() {
            return None;
        }
        let indices = &self.order[self.cursor..self.cursor + self.batch_size];
        let batch = self.build_batch(&indices.to_vec());
        self.cursor += self.batch_size;
        Some(batch)
    }
}
