use crate::autograd::{Function, GradFn};
use crate::error::{GradError, Result};
use crate::{RawTensor, Tensor};

/// Fused MSE backward: ∂L/∂pᵢ = g · 2(pᵢ - tᵢ) / n
///
/// Targets are constants for this operator, so they are not graph inputs.
pub struct MseGradFn {
    diff: Vec<f64>,
}

impl GradFn for MseGradFn {
    fn backward(&self, out_grad: &[f64]) -> Vec<f64> {
        let scale = out_grad[0] * 2.0 / self.diff.len() as f64;
        self.diff.iter().map(|&d| scale * d).collect()
    }

    fn name(&self) -> &'static str {
        "mse_loss"
    }
}

/// Fused cross-entropy backward
///
/// Only the selected class of each sample receives gradient:
/// ∂L/∂p[i, cᵢ] = -g / (p[i, cᵢ] · batch).
pub struct CrossEntropyGradFn {
    input_size: usize,
    batch: usize,
    // (flat index of p[i, cᵢ], p[i, cᵢ])
    selected: Vec<(usize, f64)>,
}

impl GradFn for CrossEntropyGradFn {
    fn backward(&self, out_grad: &[f64]) -> Vec<f64> {
        let mut grad = vec![0.0; self.input_size];
        for &(index, prob) in &self.selected {
            grad[index] = -out_grad[0] / (prob * self.batch as f64);
        }
        grad
    }

    fn name(&self) -> &'static str {
        "cross_entropy_loss"
    }
}

// ===== LOSS FUNCTIONS =====
impl RawTensor {
    /// Mean squared error, `mean((pred - target)²)`, as one fused operator
    ///
    /// Only the flat element counts must agree. The output tracks gradients
    /// when `pred` does.
    ///
    /// # Errors
    /// - `SizeMismatch` if the element counts differ
    /// - `EmptyTensor` if there are no elements
    pub fn mse_loss(pred: &Tensor, target: &Tensor) -> Result<Tensor> {
        let (diff, req_grad) = {
            let p = pred.borrow();
            let t = target.borrow();
            if p.data.len() != t.data.len() {
                return Err(GradError::SizeMismatch {
                    op: "mse_loss",
                    expected: p.data.len(),
                    actual: t.data.len(),
                });
            }
            if p.data.is_empty() {
                return Err(GradError::EmptyTensor { op: "mse_loss" });
            }
            let diff: Vec<f64> = p.data.iter().zip(&t.data).map(|(&p, &t)| p - t).collect();
            (diff, p.requires_grad)
        };

        let loss = diff.iter().map(|d| d * d).sum::<f64>() / diff.len() as f64;
        let out = Self::from_op(vec![loss], &[1], req_grad);
        Function::attach(&out, vec![pred.clone()], MseGradFn { diff });
        Ok(out)
    }

    /// Cross-entropy over pre-normalized probabilities
    ///
    /// `probs` is `[batch, num_classes]`, `targets` is `[batch]` holding class
    /// indices stored as floats. No softmax is applied:
    /// `loss = -(1/batch) · Σᵢ ln(probs[i, targets[i]])`.
    ///
    /// # Errors
    /// - `ShapeMismatch` unless `probs` is rank 2 and `targets` rank 1
    /// - `BatchMismatch` if the batch sizes differ
    /// - `EmptyTensor` for an empty batch
    /// - `InvalidClassIndex` if a target is not an integer in `[0, num_classes)`
    /// - `NonPositiveProbability` if a selected probability is `<= 0`
    pub fn cross_entropy_loss(probs: &Tensor, targets: &Tensor) -> Result<Tensor> {
        let (selected, input_size, batch, req_grad) = {
            let p = probs.borrow();
            let t = targets.borrow();
            if p.shape.len() != 2 || t.shape.len() != 1 {
                return Err(GradError::ShapeMismatch {
                    op: "cross_entropy_loss",
                    lhs: p.shape.clone(),
                    rhs: t.shape.clone(),
                });
            }
            let (batch, num_classes) = (p.shape[0], p.shape[1]);
            if batch != t.shape[0] {
                return Err(GradError::BatchMismatch {
                    predictions: batch,
                    targets: t.shape[0],
                });
            }
            if batch == 0 {
                return Err(GradError::EmptyTensor {
                    op: "cross_entropy_loss",
                });
            }

            let mut selected = Vec::with_capacity(batch);
            for (sample, &target) in t.data.iter().enumerate() {
                let valid = target.fract() == 0.0 && target >= 0.0 && target < num_classes as f64;
                if !valid {
                    return Err(GradError::InvalidClassIndex {
                        sample,
                        index: target,
                        num_classes,
                    });
                }
                let index = sample * num_classes + target as usize;
                let prob = p.data[index];
                if prob <= 0.0 || prob.is_nan() {
                    return Err(GradError::NonPositiveProbability {
                        sample,
                        value: prob,
                    });
                }
                selected.push((index, prob));
            }
            (selected, p.data.len(), batch, p.requires_grad)
        };

        let total: f64 = selected.iter().map(|&(_, prob)| prob.ln()).sum();
        let loss = -total / batch as f64;
        let out = Self::from_op(vec![loss], &[1], req_grad);
        Function::attach(
            &out,
            vec![probs.clone()],
            CrossEntropyGradFn {
                input_size,
                batch,
                selected,
            },
        );
        Ok(out)
    }
}
