use crate::error::Result;
use crate::nn::Module;
use crate::tensor::{RawTensor, Tensor, TensorOps};
use rand::Rng;
use rand_distr::StandardNormal;

/// Element-wise affine layer
///
/// Computes: y = w * x + b
/// where x, w and b all have shape `[features]`. There is no broadcasting, so
/// each sample is fed through on its own.
pub struct Affine {
    pub weight: Tensor,
    pub bias: Tensor,
}

impl Module for Affine {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        x.mul(&self.weight)?.add(&self.bias)
    }

    fn parameters(&self) -> Vec<Tensor> {
        vec![self.weight.clone(), self.bias.clone()]
    }

    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        vec![
            ("weight".to_string(), self.weight.clone()),
            ("bias".to_string(), self.bias.clone()),
        ]
    }
}

impl Affine {
    /// Create a layer with weights drawn from N(0, 1) and zero bias
    ///
    /// The generator is passed in so initialization is reproducible.
    pub fn new<R: Rng>(features: usize, rng: &mut R) -> Self {
        let data: Vec<f64> = (0..features)
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();
        Affine {
            weight: RawTensor::from_op(data, &[features], true),
            bias: RawTensor::from_op(vec![0.0; features], &[features], true),
        }
    }

    /// Create a layer from explicit weight and bias values
    ///
    /// # Errors
    /// `ShapeMismatch` if the two slices differ in length.
    pub fn from_values(weight: &[f64], bias: &[f64]) -> Result<Self> {
        let features = weight.len();
        let weight = RawTensor::from_flat(weight.to_vec(), &[features], true)?;
        let bias = RawTensor::from_flat(bias.to_vec(), &[features], true)?;
        Ok(Affine { weight, bias })
    }
}
