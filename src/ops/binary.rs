use crate::autograd::{Function, GradFn};
use crate::error::{GradError, Result};
use crate::{RawTensor, Tensor};

/// Binary element-wise operations: two inputs of identical shape, one output
///
/// There is no broadcasting; operands must agree in rank and every dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add, // x + y
    Sub, // x - y
    Mul, // x * y (element-wise)
    Div, // x / y (element-wise), y must have no zero element
}

impl BinaryOp {
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
        }
    }

    fn apply(self, x: f64, y: f64) -> f64 {
        match self {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div => x / y,
        }
    }
}

/// Gradient function for binary operations
///
/// `lhs` / `rhs` are copies of the operands taken at forward time; Add and Sub
/// leave them empty since their rules do not read operand values.
pub struct BinaryGradFn {
    op: BinaryOp,
    lhs: Vec<f64>,
    rhs: Vec<f64>,
}

impl GradFn for BinaryGradFn {
    fn backward(&self, out_grad: &[f64]) -> Vec<f64> {
        let mut grads = Vec::with_capacity(2 * out_grad.len());
        match self.op {
            BinaryOp::Add => {
                // ∂(x+y)/∂x = 1, ∂(x+y)/∂y = 1
                grads.extend_from_slice(out_grad);
                grads.extend_from_slice(out_grad);
            }
            BinaryOp::Sub => {
                // ∂(x-y)/∂x = 1, ∂(x-y)/∂y = -1
                grads.extend_from_slice(out_grad);
                grads.extend(out_grad.iter().map(|&g| -g));
            }
            BinaryOp::Mul => {
                // ∂(x*y)/∂x = y, ∂(x*y)/∂y = x
                grads.extend(out_grad.iter().zip(&self.rhs).map(|(&g, &y)| g * y));
                grads.extend(out_grad.iter().zip(&self.lhs).map(|(&g, &x)| g * x));
            }
            BinaryOp::Div => {
                // ∂(x/y)/∂x = 1/y, ∂(x/y)/∂y = -x/y²
                grads.extend(out_grad.iter().zip(&self.rhs).map(|(&g, &y)| g / y));
                grads.extend(
                    out_grad
                        .iter()
                        .zip(&self.lhs)
                        .zip(&self.rhs)
                        .map(|((&g, &x), &y)| -g * x / (y * y)),
                );
            }
        }
        grads
    }

    fn name(&self) -> &'static str {
        self.op.name()
    }
}

impl RawTensor {
    /// Apply a binary element-wise operation
    ///
    /// The output tracks gradients if either operand does, and only then
    /// carries a producer.
    ///
    /// # Errors
    /// - `ShapeMismatch` if the operand shapes differ
    /// - `DivisionByZero` for `Div` when any divisor element is exactly zero
    pub fn binary_op(self_t: &Tensor, other: &Tensor, op: BinaryOp) -> Result<Tensor> {
        let (lhs, rhs, shape, requires_grad) = {
            let a = self_t.borrow();
            let b = other.borrow();
            if a.shape != b.shape {
                return Err(GradError::ShapeMismatch {
                    op: op.name(),
                    lhs: a.shape.clone(),
                    rhs: b.shape.clone(),
                });
            }
            if op == BinaryOp::Div
                && let Some(index) = b.data.iter().position(|&y| y == 0.0)
            {
                return Err(GradError::DivisionByZero { index });
            }
            (
                a.data.clone(),
                b.data.clone(),
                a.shape.clone(),
                a.requires_grad || b.requires_grad,
            )
        };

        let result: Vec<f64> = lhs
            .iter()
            .zip(&rhs)
            .map(|(&x, &y)| op.apply(x, y))
            .collect();
        let out = Self::from_op(result, &shape, requires_grad);

        if requires_grad {
            let (lhs, rhs) = match op {
                BinaryOp::Add | BinaryOp::Sub => (Vec::new(), Vec::new()),
                BinaryOp::Mul | BinaryOp::Div => (lhs, rhs),
            };
            Function::attach(
                &out,
                vec![self_t.clone(), other.clone()],
                BinaryGradFn { op, lhs, rhs },
            );
        }
        Ok(out)
    }

    pub fn add(self_t: &Tensor, other: &Tensor) -> Result<Tensor> {
        Self::binary_op(self_t, other, BinaryOp::Add)
    }
    pub fn sub(self_t: &Tensor, other: &Tensor) -> Result<Tensor> {
        Self::binary_op(self_t, other, BinaryOp::Sub)
    }
    pub fn mul(self_t: &Tensor, other: &Tensor) -> Result<Tensor> {
        Self::binary_op(self_t, other, BinaryOp::Mul)
    }
    pub fn div(self_t: &Tensor, other: &Tensor) -> Result<Tensor> {
        Self::binary_op(self_t, other, BinaryOp::Div)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TensorOps;
    use approx::assert_abs_diff_eq;

    fn tensor(data: &[f64], requires_grad: bool) -> Tensor {
        RawTensor::from_flat(data.to_vec(), &[data.len()], requires_grad).unwrap()
    }

    #[test]
    fn forward_values() {
        let a = tensor(&[1.0, 2.0, 3.0], false);
        let b = tensor(&[4.0, 5.0, 6.0], false);
        assert_eq!(a.add(&b).unwrap().values(), vec![5.0, 7.0, 9.0]);
        assert_eq!(a.sub(&b).unwrap().values(), vec![-3.0, -3.0, -3.0]);
        assert_eq!(a.mul(&b).unwrap().values(), vec![4.0, 10.0, 18.0]);
        assert_eq!(b.div(&a).unwrap().values(), vec![4.0, 2.5, 2.0]);
    }

    #[test]
    fn shape_mismatch_includes_rank() {
        let a = RawTensor::ones(&[2, 3], false).unwrap();
        let b = RawTensor::ones(&[3, 2], false).unwrap();
        let c = RawTensor::ones(&[6], false).unwrap();
        assert!(matches!(
            a.add(&b),
            Err(GradError::ShapeMismatch { op: "add", .. })
        ));
        assert!(matches!(
            a.mul(&c),
            Err(GradError::ShapeMismatch { op: "mul", .. })
        ));
    }

    #[test]
    fn division_by_zero_is_rejected() {
        let a = tensor(&[1.0, 2.0, 3.0], true);
        let b = tensor(&[1.0, 0.0, 3.0], true);
        assert!(matches!(
            a.div(&b),
            Err(GradError::DivisionByZero { index: 1 })
        ));
        let neg_zero = tensor(&[1.0, 1.0, -0.0], false);
        assert!(matches!(
            a.div(&neg_zero),
            Err(GradError::DivisionByZero { index: 2 })
        ));
    }

    #[test]
    fn add_and_sub_gradients() {
        let a = tensor(&[1.0, 2.0], true);
        let b = tensor(&[3.0, 4.0], true);
        a.sub(&b).unwrap().sum().unwrap().backward().unwrap();
        assert_eq!(a.grad(), Some(vec![1.0, 1.0]));
        assert_eq!(b.grad(), Some(vec![-1.0, -1.0]));

        a.zero_grad();
        b.zero_grad();
        a.add(&b).unwrap().sum().unwrap().backward().unwrap();
        assert_eq!(a.grad(), Some(vec![1.0, 1.0]));
        assert_eq!(b.grad(), Some(vec![1.0, 1.0]));
    }

    #[test]
    fn div_gradients() {
        let a = tensor(&[3.0], true);
        let b = tensor(&[2.0], true);
        a.div(&b).unwrap().backward().unwrap();
        assert_abs_diff_eq!(a.grad().unwrap()[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(b.grad().unwrap()[0], -0.75, epsilon = 1e-12);
    }

    #[test]
    fn backward_uses_forward_time_snapshot() {
        let a = tensor(&[2.0], true);
        let b = tensor(&[5.0], true);
        let y = a.mul(&b).unwrap();
        // an optimizer-style write after the forward pass
        b.borrow_mut().data[0] = 100.0;
        y.backward().unwrap();
        assert_eq!(a.grad(), Some(vec![5.0]));
        assert_eq!(b.grad(), Some(vec![2.0]));
    }

    #[test]
    fn same_tensor_on_both_sides() {
        let x = tensor(&[3.0], true);
        x.mul(&x).unwrap().backward().unwrap();
        assert_eq!(x.grad(), Some(vec![6.0]));
    }
}
