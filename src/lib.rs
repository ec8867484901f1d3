//! Reverse-mode automatic differentiation for dense `f64` tensors.
//!
//! Operations build the computation graph as they run: every result that
//! tracks gradients owns a [`Function`] recording its inputs and a local
//! backward rule. [`run_backward`] walks that graph from a scalar loss and
//! accumulates gradients into the leaf tensors, which an optimizer such as
//! [`SGD`] then consumes.
//!
//! ```
//! use gradcore::{RawTensor, TensorOps};
//!
//! let a = RawTensor::from_flat(vec![1.0, 2.0, 3.0], &[3], true)?;
//! let b = RawTensor::from_flat(vec![4.0, 5.0, 6.0], &[3], true)?;
//! let loss = a.mul(&b)?.mean()?;
//! loss.backward()?;
//! assert_eq!(b.grad(), Some(vec![1.0 / 3.0, 2.0 / 3.0, 1.0]));
//! # Ok::<(), gradcore::GradError>(())
//! ```

pub mod autograd;
pub mod data;
pub mod error;
pub mod io;
pub mod nn;
pub mod ops;
pub mod tensor;
pub mod train;
pub mod utils;

pub use autograd::{Function, GradFn};
pub use data::{DataLoader, Dataset, TensorDataset};
pub use error::{GradError, Result};
pub use io::config::{LossKind, TrainConfig};
pub use nn::optim::{Optimizer, SGD};
pub use nn::{Affine, Module, ReLU, Sequential};
pub use tensor::{RawTensor, Tensor, TensorOps};
pub use train::Trainer;
pub use utils::ProgressBar;

// ===== PUBLIC API EXPORTS =====

// Tensor constructors
pub fn from_flat(data: Vec<f64>, shape: &[usize], requires_grad: bool) -> Result<Tensor> {
    RawTensor::from_flat(data, shape, requires_grad)
}

pub fn ones(shape: &[usize], requires_grad: bool) -> Result<Tensor> {
    RawTensor::ones(shape, requires_grad)
}

pub fn zeros(shape: &[usize]) -> Result<Tensor> {
    RawTensor::zeros(shape)
}

// Element-wise and reduction operators
pub fn add(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    RawTensor::add(a, b)
}

pub fn subtract(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    RawTensor::sub(a, b)
}

pub fn multiply(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    RawTensor::mul(a, b)
}

pub fn divide(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    RawTensor::div(a, b)
}

pub fn mean(t: &Tensor) -> Result<Tensor> {
    RawTensor::mean(t)
}

pub fn relu(t: &Tensor) -> Tensor {
    RawTensor::relu(t)
}

// Loss functions
pub fn mean_squared_error(predictions: &Tensor, targets: &Tensor) -> Result<Tensor> {
    RawTensor::mse_loss(predictions, targets)
}

pub fn cross_entropy(predictions: &Tensor, targets: &Tensor) -> Result<Tensor> {
    RawTensor::cross_entropy_loss(predictions, targets)
}

// Backward pass
pub fn run_backward(loss: &Tensor) -> Result<()> {
    RawTensor::backward(loss)
}

// Gradient checking
pub fn check_gradients<F>(
    tensor: &Tensor,
    loss_fn: F,
    epsilon: f64,
    tolerance: f64,
) -> Result<(f64, f64, bool)>
where
    F: Fn(&Tensor) -> Result<Tensor>,
{
    RawTensor::check_gradients(tensor, loss_fn, epsilon, tolerance)
}

pub fn check_gradients_simple<F>(tensor: &Tensor, loss_fn: F) -> Result<bool>
where
    F: Fn(&Tensor) -> Result<Tensor>,
{
    RawTensor::check_gradients_simple(tensor, loss_fn)
}
