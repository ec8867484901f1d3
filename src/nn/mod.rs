use crate::error::{GradError, Result};
use crate::io::{StateDict, TensorData, diff_state_dict};
use crate::tensor::Tensor;

pub mod layers;
pub mod optim;

pub use layers::{Affine, ReLU, Sequential};
pub use optim::{Optimizer, SGD};

/// A differentiable model component.
///
/// A module owns its parameters (leaf tensors with `requires_grad = true`)
/// and rebuilds the graph on every `forward` call, so user code is free to
/// branch and loop between calls.
pub trait Module {
    fn forward(&self, x: &Tensor) -> Result<Tensor>;
    fn parameters(&self) -> Vec<Tensor>;

    /// Parameters keyed by a stable name, used for state dicts.
    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        self.parameters()
            .into_iter()
            .enumerate()
            .map(|(i, p)| (i.to_string(), p))
            .collect()
    }

    /// Reset the gradient buffer of every parameter to zero.
    fn zero_grad(&self) {
        for p in self.parameters() {
            p.borrow_mut().zero_grad();
        }
    }

    fn state_dict(&self) -> StateDict {
        self.named_parameters()
            .into_iter()
            .map(|(name, p)| (name, TensorData::from_tensor(&p)))
            .collect()
    }

    /// Copy values from `state` into the parameters in place.
    ///
    /// Nothing is written unless every key is present with a matching shape,
    /// every entry's data length agrees with its shape, and no unexpected key
    /// is supplied.
    fn load_state_dict(&self, state: &StateDict) -> Result<()> {
        let diff = diff_state_dict(&self.state_dict(), state);
        if !diff.is_empty() {
            return Err(GradError::StateDict(format!(
                "missing {:?}, unexpected {:?}, shape mismatches {:?}, corrupt entries {:?}",
                diff.missing_keys,
                diff.unexpected_keys,
                diff.shape_mismatches,
                diff.corrupt_entries
            )));
        }
        for (name, param) in self.named_parameters() {
            if let Some(td) = state.get(&name) {
                param.borrow_mut().data.copy_from_slice(&td.data);
            }
        }
        Ok(())
    }
}
