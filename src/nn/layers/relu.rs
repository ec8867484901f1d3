use crate::error::Result;
use crate::nn::Module;
use crate::tensor::{Tensor, TensorOps};

pub struct ReLU;

impl Module for ReLU {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        Ok(x.relu())
    }

    fn parameters(&self) -> Vec<Tensor> {
        vec![] // No learnable params
    }
}
