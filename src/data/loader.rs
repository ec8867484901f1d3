use crate::data::Dataset;
use crate::error::{GradError, Result};
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// One batch: the inputs and targets of each sample, in batch order.
pub type Batch = (Vec<Tensor>, Vec<Tensor>);

/// Iterates a dataset in fixed-size batches
///
/// Shuffling draws from the loader's own generator, so two loaders built
/// with the same seed visit samples in the same order.
pub struct DataLoader<D: Dataset> {
    dataset: D,
    batch_size: usize,
    shuffle: bool,
    indices: Vec<usize>,
    current: usize,
    rng: StdRng,
}

impl<D: Dataset> DataLoader<D> {
    /// # Errors
    /// `Data` if `batch_size` is zero.
    pub fn new(dataset: D, batch_size: usize, shuffle: bool, rng: StdRng) -> Result<Self> {
        if batch_size == 0 {
            return Err(GradError::Data("batch size must be positive".to_string()));
        }
        let indices = (0..dataset.len()).collect();
        let mut loader = DataLoader {
            dataset,
            batch_size,
            shuffle,
            indices,
            current: 0,
            rng,
        };
        loader.reset();
        Ok(loader)
    }

    /// Convenience constructor seeding a `StdRng` from `seed`.
    pub fn with_seed(dataset: D, batch_size: usize, shuffle: bool, seed: u64) -> Result<Self> {
        Self::new(dataset, batch_size, shuffle, StdRng::seed_from_u64(seed))
    }

    /// Rewind to the first batch, reshuffling when enabled.
    pub fn reset(&mut self) {
        self.current = 0;
        if self.shuffle {
            self.indices.shuffle(&mut self.rng);
            tracing::debug!(samples = self.indices.len(), "reshuffled data loader");
        }
    }

    /// Next batch, or `None` once every sample has been served.
    ///
    /// The final batch may be shorter than `batch_size`.
    pub fn next_batch(&mut self) -> Result<Option<Batch>> {
        if self.current >= self.indices.len() {
            return Ok(None);
        }

        let end = (self.current + self.batch_size).min(self.indices.len());
        let mut inputs = Vec::with_capacity(end - self.current);
        let mut targets = Vec::with_capacity(end - self.current);
        for &idx in &self.indices[self.current..end] {
            let (input, target) = self.dataset.get_item(idx)?;
            inputs.push(input);
            targets.push(target);
        }

        self.current = end;
        Ok(Some((inputs, targets)))
    }

    pub fn num_batches(&self) -> usize {
        self.indices.len().div_ceil(self.batch_size)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }
}

impl<D: Dataset> Iterator for DataLoader<D> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TensorDataset;
    use crate::{RawTensor, TensorOps};

    fn dataset(n: usize) -> TensorDataset {
        let inputs = (0..n).map(|i| RawTensor::scalar(i as f64, false)).collect();
        let targets = (0..n).map(|i| RawTensor::scalar(-(i as f64), false)).collect();
        TensorDataset::new(inputs, targets).unwrap()
    }

    fn epoch_order<D: Dataset>(loader: &mut DataLoader<D>) -> Vec<f64> {
        loader
            .by_ref()
            .flat_map(|batch| batch.unwrap().0)
            .map(|t| t.item())
            .collect()
    }

    #[test]
    fn batches_cover_dataset_in_order() {
        let mut loader = DataLoader::with_seed(dataset(5), 2, false, 0).unwrap();
        assert_eq!(loader.num_batches(), 3);

        let sizes: Vec<usize> = loader.by_ref().map(|b| b.unwrap().0.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(loader.next_batch().unwrap().is_none());

        loader.reset();
        assert_eq!(epoch_order(&mut loader), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn same_seed_same_shuffle() {
        let mut a = DataLoader::with_seed(dataset(16), 4, true, 42).unwrap();
        let mut b = DataLoader::with_seed(dataset(16), 4, true, 42).unwrap();
        let order_a = epoch_order(&mut a);
        assert_eq!(order_a, epoch_order(&mut b));

        let mut sorted = order_a.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(sorted, (0..16).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn targets_stay_paired_with_inputs() {
        let mut loader = DataLoader::with_seed(dataset(8), 3, true, 9).unwrap();
        while let Some((inputs, targets)) = loader.next_batch().unwrap() {
            for (x, y) in inputs.iter().zip(&targets) {
                assert_eq!(x.item(), -y.item());
            }
        }
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(DataLoader::with_seed(dataset(2), 0, false, 0).is_err());
    }
}
