use crate::autograd::{Function, GradFn};
use crate::error::{GradError, Result};
use crate::{RawTensor, Tensor};

/// Reduction operations: reduce tensor to scalar
///
/// These collapse all dimensions into a shape `[1]` output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReduceOp {
    Sum,  // Σ(x) - gradient broadcasts g
    Mean, // mean(x) - gradient broadcasts g/n
}

/// Gradient function for Sum reduction
pub struct SumGradFn {
    input_size: usize,
}

impl GradFn for SumGradFn {
    fn backward(&self, out_grad: &[f64]) -> Vec<f64> {
        vec![out_grad[0]; self.input_size]
    }

    fn name(&self) -> &'static str {
        "sum"
    }
}

/// Gradient function for Mean reduction
///
/// Each element gets gradient / `input_size`.
pub struct MeanGradFn {
    input_size: usize,
}

impl GradFn for MeanGradFn {
    fn backward(&self, out_grad: &[f64]) -> Vec<f64> {
        let grad_val = out_grad[0] / self.input_size as f64;
        vec![grad_val; self.input_size]
    }

    fn name(&self) -> &'static str {
        "mean"
    }
}

// ===== REDUCE OPERATIONS =====

impl RawTensor {
    /// Apply a reduction operation that collapses tensor to scalar
    ///
    /// # Errors
    /// `EmptyTensor` if the input has no elements.
    pub fn reduce_op(self_t: &Tensor, op: ReduceOp) -> Result<Tensor> {
        let (total, size, req_grad) = {
            let s = self_t.borrow();
            (s.data.iter().sum::<f64>(), s.data.len(), s.requires_grad)
        };
        if size == 0 {
            return Err(GradError::EmptyTensor {
                op: match op {
                    ReduceOp::Sum => "sum",
                    ReduceOp::Mean => "mean",
                },
            });
        }

        let out = match op {
            ReduceOp::Sum => {
                let out = Self::from_op(vec![total], &[1], req_grad);
                Function::attach(&out, vec![self_t.clone()], SumGradFn { input_size: size });
                out
            }
            ReduceOp::Mean => {
                let out = Self::from_op(vec![total / size as f64], &[1], req_grad);
                Function::attach(&out, vec![self_t.clone()], MeanGradFn { input_size: size });
                out
            }
        };
        Ok(out)
    }

    pub fn sum(self_t: &Tensor) -> Result<Tensor> {
        Self::reduce_op(self_t, ReduceOp::Sum)
    }
    pub fn mean(self_t: &Tensor) -> Result<Tensor> {
        Self::reduce_op(self_t, ReduceOp::Mean)
    }
}
