use crate::error::{GradError, Result};
use crate::tensor::{RawTensor, Tensor, TensorOps};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

// ===== GRADIENT FUNCTION TRAIT =====

/// Trait for local backward rules.
///
/// Each operation implements this on a small struct holding copies of the
/// forward-time values it needs, so a later optimizer step on an operand
/// cannot change the gradient of an already-built graph.
///
/// `backward` takes the gradient of the loss w.r.t. the operation's output
/// (one value per output element) and returns one gradient segment per input,
/// concatenated in input order, each segment as long as that input.
pub trait GradFn {
    fn backward(&self, out_grad: &[f64]) -> Vec<f64>;
    /// Operation name, used in `Debug` output.
    fn name(&self) -> &'static str;
}

// ===== GRAPH NODE =====

/// Record of one differentiable operation.
///
/// Owned by the output tensor through `RawTensor::producer`. It holds `Rc`
/// handles to its inputs but never to its output, so edges only point from
/// outputs back to inputs and no reference cycle can form.
pub struct Function {
    inputs: Vec<Tensor>,
    output_shape: Vec<usize>,
    rule: Box<dyn GradFn>,
}

impl Function {
    /// Attach a producer to `output` when it tracks gradients.
    ///
    /// Leaves and tensors outside the graph never carry a producer.
    pub(crate) fn attach(output: &Tensor, inputs: Vec<Tensor>, rule: impl GradFn + 'static) {
        let mut out = output.borrow_mut();
        if !out.requires_grad {
            return;
        }
        out.producer = Some(Function {
            inputs,
            output_shape: out.shape.clone(),
            rule: Box::new(rule),
        });
    }

    pub fn inputs(&self) -> &[Tensor] {
        &self.inputs
    }

    pub fn output_shape(&self) -> &[usize] {
        &self.output_shape
    }

    pub fn name(&self) -> &'static str {
        self.rule.name()
    }

    /// Run the local backward rule.
    pub fn apply(&self, out_grad: &[f64]) -> Vec<f64> {
        self.rule.backward(out_grad)
    }
}

// ===== BACKPROPAGATION =====

type NodeId = *const RefCell<RawTensor>;

impl RawTensor {
    /// Run backpropagation starting from this tensor
    ///
    /// 1. Seed the root with an upstream gradient of 1.0
    /// 2. Order every non-leaf node reachable from the root topologically
    ///    (post-order DFS)
    /// 3. Walk that order from the root down, so each node's gradient holds
    ///    the sum over all of its consumers before its rule runs
    /// 4. Add each rule's per-input segments into the inputs: pending buffers
    ///    for intermediate nodes, the gradient buffer for leaves
    ///
    /// Leaf gradients are accumulated, never overwritten; call `zero_grad`
    /// between steps.
    ///
    /// # Errors
    /// `UngradedBackward` if the root does not track gradients or its shape is
    /// not `[1]`.
    pub fn backward(root: &Tensor) -> Result<()> {
        enum Action {
            Visit(Tensor),
            PostVisit(Tensor),
        }

        {
            let r = root.borrow();
            if !r.requires_grad || r.shape != [1] {
                return Err(GradError::UngradedBackward {
                    shape: r.shape.clone(),
                    requires_grad: r.requires_grad,
                });
            }
            if r.producer.is_none() {
                drop(r);
                root.borrow_mut().accumulate_grad(&[1.0]);
                return Ok(());
            }
        }

        // 1. Build topological order over non-leaf nodes.
        // The stack stands in for recursion so deep chains cannot overflow.
        let mut topo_order = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut stack = vec![Action::Visit(root.clone())];

        while let Some(action) = stack.pop() {
            match action {
                Action::Visit(t) => {
                    if !visited.insert(Rc::as_ptr(&t)) {
                        continue;
                    }
                    stack.push(Action::PostVisit(t.clone()));
                    let node = t.borrow();
                    if let Some(function) = node.producer.as_ref() {
                        for input in function.inputs() {
                            if !input.borrow().is_leaf() {
                                stack.push(Action::Visit(input.clone()));
                            }
                        }
                    }
                }
                Action::PostVisit(t) => topo_order.push(t),
            }
        }

        // 2. Consumers before producers: topo_order is [.., root], so reverse it.
        let mut pending: HashMap<NodeId, Vec<f64>> = HashMap::new();
        pending.insert(Rc::as_ptr(root), vec![1.0]);

        for node in topo_order.into_iter().rev() {
            let Some(out_grad) = pending.remove(&Rc::as_ptr(&node)) else {
                continue;
            };

            let (inputs, segments) = {
                let n = node.borrow();
                let Some(function) = n.producer.as_ref() else {
                    continue;
                };
                (function.inputs.clone(), function.apply(&out_grad))
            };

            let mut offset = 0;
            for input in &inputs {
                let size = input.size();
                let segment = &segments[offset..offset + size];
                offset += size;

                let mut inp = input.borrow_mut();
                if !inp.requires_grad {
                    continue;
                }
                if inp.is_leaf() {
                    inp.accumulate_grad(segment);
                } else {
                    let buf = pending
                        .entry(Rc::as_ptr(input))
                        .or_insert_with(|| vec![0.0; size]);
                    for (b, s) in buf.iter_mut().zip(segment) {
                        *b += s;
                    }
                }
            }
            debug_assert_eq!(offset, segments.len());
        }

        Ok(())
    }
}

// ===== NUMERICAL GRADIENT CHECKING =====

impl RawTensor {
    /// Check gradients numerically using finite differences
    ///
    /// Analytical gradient: what `backward` accumulates into `tensor`.
    /// Numerical gradient: `(f(x+ε) - f(x-ε)) / (2ε)` per element.
    ///
    /// `tensor` must be a leaf that tracks gradients; its gradient buffer is
    /// reset before the analytical pass.
    ///
    /// # Returns
    /// `(max_error, mean_error, passed)`, where errors are relative when the
    /// numerical gradient is not tiny and absolute otherwise.
    pub fn check_gradients<F>(
        tensor: &Tensor,
        loss_fn: F,
        epsilon: f64,
        tolerance: f64,
    ) -> Result<(f64, f64, bool)>
    where
        F: Fn(&Tensor) -> Result<Tensor>,
    {
        tensor.zero_grad();
        let loss = loss_fn(tensor)?;
        loss.backward()?;

        let analytical_grad = tensor.grad().unwrap_or_default();
        let (original_data, original_shape, requires_grad) = {
            let t = tensor.borrow();
            (t.data.clone(), t.shape.clone(), t.requires_grad)
        };

        let mut numerical_grad = vec![0.0; original_data.len()];
        for (i, slot) in numerical_grad.iter_mut().enumerate() {
            let mut data_plus = original_data.clone();
            data_plus[i] += epsilon;
            let tensor_plus = RawTensor::from_flat(data_plus, &original_shape, requires_grad)?;
            let val_plus = loss_fn(&tensor_plus)?.item();

            let mut data_minus = original_data.clone();
            data_minus[i] -= epsilon;
            let tensor_minus = RawTensor::from_flat(data_minus, &original_shape, requires_grad)?;
            let val_minus = loss_fn(&tensor_minus)?.item();

            *slot = (val_plus - val_minus) / (2.0 * epsilon);
        }

        if analytical_grad.len() != numerical_grad.len() {
            return Err(GradError::SizeMismatch {
                op: "check_gradients",
                expected: numerical_grad.len(),
                actual: analytical_grad.len(),
            });
        }

        let mut max_error: f64 = 0.0;
        let mut total_error = 0.0;
        for (&analytical, &numerical) in analytical_grad.iter().zip(&numerical_grad) {
            let error = (analytical - numerical).abs();
            let relative_error = if numerical.abs() > 1e-8 {
                error / numerical.abs()
            } else {
                error
            };
            max_error = max_error.max(relative_error);
            total_error += relative_error;
        }

        let mean_error = if numerical_grad.is_empty() {
            0.0
        } else {
            total_error / numerical_grad.len() as f64
        };
        Ok((max_error, mean_error, max_error < tolerance))
    }

    /// Gradient check with `epsilon = 1e-5` and `tolerance = 1e-4`.
    pub fn check_gradients_simple<F>(tensor: &Tensor, loss_fn: F) -> Result<bool>
    where
        F: Fn(&Tensor) -> Result<Tensor>,
    {
        let (_, _, passed) = Self::check_gradients(tensor, loss_fn, 1e-5, 1e-4)?;
        Ok(passed)
    }
}
