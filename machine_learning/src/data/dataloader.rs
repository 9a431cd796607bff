use std::num::NonZeroUsize;

use ndarray::{Array1, Array2, Axis};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use super::Dataset;

/// An owned mini-batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// `[b, features]`
    pub images: Array2<f32>,
    /// `[b]`
    pub labels: Array1<usize>,
}

impl Batch {
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Something that yields the mini-batches of an epoch.
pub trait BatchSource {
    /// The amount of batches a full epoch is expected to yield.
    fn num_batches(&self) -> usize;

    /// Starts a new epoch, returning a lazy iterator over its batches.
    fn batches(&mut self) -> Box<dyn Iterator<Item = Batch> + '_>;
}

/// Splits an in-memory `Dataset` into batches of at most `batch_size` samples.
///
/// Batches are contiguous unless a shuffle seed is given, in which case the sample order is
/// reshuffled at the start of every epoch.
#[derive(Debug, Clone)]
pub struct DataLoader {
    dataset: Dataset,
    batch_size: NonZeroUsize,
    order: Vec<usize>,
    rng: Option<StdRng>,
}

impl DataLoader {
    pub fn new(dataset: Dataset, batch_size: NonZeroUsize) -> Self {
        let order = (0..dataset.len()).collect();

        Self {
            dataset,
            batch_size,
            order,
            rng: None,
        }
    }

    /// Reshuffles the samples every epoch with an rng seeded from `seed`.
    pub fn shuffled(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        self
    }
}

impl BatchSource for DataLoader {
    fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size.get())
    }

    fn batches(&mut self) -> Box<dyn Iterator<Item = Batch> + '_> {
        if let Some(rng) = &mut self.rng {
            self.order.shuffle(rng);
        }

        let images = self.dataset.images();
        let labels = self.dataset.labels();

        Box::new(self.order.chunks(self.batch_size.get()).map(move |idx| Batch {
            images: images.select(Axis(0), idx),
            labels: labels.select(Axis(0), idx),
        }))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array, array};

    use super::*;

    fn dataset(n: usize) -> Dataset {
        let images = Array::from_shape_fn((n, 2), |(i, j)| (i * 10 + j) as f32);
        let labels = Array::from_shape_fn(n, |i| i % 3);
        Dataset::new(images, labels, 3).unwrap()
    }

    #[test]
    fn batches_respect_the_batch_size() {
        let mut dl = DataLoader::new(dataset(5), NonZeroUsize::new(2).unwrap());
        assert_eq!(dl.num_batches(), 3);

        let batches: Vec<_> = dl.batches().collect();
        assert_eq!(batches.iter().map(Batch::len).collect::<Vec<_>>(), [2, 2, 1]);
        assert_eq!(batches[1].images, array![[20., 21.], [30., 31.]]);
        assert_eq!(batches[2].labels, array![1]);
    }

    #[test]
    fn batches_restart_every_epoch() {
        let mut dl = DataLoader::new(dataset(4), NonZeroUsize::new(3).unwrap());

        let first: Vec<_> = dl.batches().collect();
        let second: Vec<_> = dl.batches().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn shuffling_keeps_every_sample() {
        let mut dl = DataLoader::new(dataset(10), NonZeroUsize::new(4).unwrap()).shuffled(3);

        let mut seen: Vec<_> = dl
            .batches()
            .flat_map(|b| b.images.column(0).to_vec())
            .collect();
        seen.sort_by(f32::total_cmp);

        let expected: Vec<_> = (0..10).map(|i| (i * 10) as f32).collect();
        assert_eq!(seen, expected);
    }
}
