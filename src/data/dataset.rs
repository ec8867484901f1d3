use crate::error::{GradError, Result};
use crate::tensor::Tensor;

/// Indexed collection of `(input, target)` samples.
pub trait Dataset {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// # Errors
    /// `Data` if `index` is out of range.
    fn get_item(&self, index: usize) -> Result<(Tensor, Tensor)>;
}

/// In-memory dataset of paired input and target tensors.
pub struct TensorDataset {
    inputs: Vec<Tensor>,
    targets: Vec<Tensor>,
}

impl TensorDataset {
    /// # Errors
    /// `Data` if the two lists differ in length.
    pub fn new(inputs: Vec<Tensor>, targets: Vec<Tensor>) -> Result<Self> {
        if inputs.len() != targets.len() {
            return Err(GradError::Data(format!(
                "{} inputs but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        Ok(TensorDataset { inputs, targets })
    }
}

impl Dataset for TensorDataset {
    fn len(&self) -> usize {
        self.inputs.len()
    }

    fn get_item(&self, index: usize) -> Result<(Tensor, Tensor)> {
        match (self.inputs.get(index), self.targets.get(index)) {
            (Some(input), Some(target)) => Ok((input.clone(), target.clone())),
            _ => Err(GradError::Data(format!(
                "index {index} out of range for dataset of {} samples",
                self.inputs.len()
            ))),
        }
    }
}
