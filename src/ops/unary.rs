use crate::autograd::{Function, GradFn};
use crate::{RawTensor, Tensor};

/// Unary operations: single input, single output
///
/// - Neg: d(-x)/dx = -1
/// - `ReLU`: d(max(0,x))/dx = x > 0 ? 1 : 0
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    ReLU,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::ReLU => "relu",
        }
    }
}

/// Gradient function for unary operations
///
/// `active` records, for ReLU, which inputs were strictly positive at forward
/// time; it is empty for Neg.
pub struct UnaryGradFn {
    op: UnaryOp,
    active: Vec<bool>,
}

impl GradFn for UnaryGradFn {
    fn backward(&self, out_grad: &[f64]) -> Vec<f64> {
        match self.op {
            UnaryOp::Neg => out_grad.iter().map(|&g| -g).collect(),
            UnaryOp::ReLU => out_grad
                .iter()
                .zip(&self.active)
                .map(|(&g, &on)| if on { g } else { 0.0 })
                .collect(),
        }
    }

    fn name(&self) -> &'static str {
        self.op.name()
    }
}

impl RawTensor {
    /// Apply a unary element-wise operation
    pub fn unary_op(self_t: &Tensor, op: UnaryOp) -> Tensor {
        let (data, shape, req_grad) = {
            let s = self_t.borrow();
            (s.data.clone(), s.shape.clone(), s.requires_grad)
        };

        let (result, active): (Vec<f64>, Vec<bool>) = match op {
            UnaryOp::Neg => (data.iter().map(|&x| -x).collect(), Vec::new()),
            UnaryOp::ReLU => (
                data.iter().map(|&x| x.max(0.0)).collect(),
                data.iter().map(|&x| x > 0.0).collect(),
            ),
        };

        let out = Self::from_op(result, &shape, req_grad);
        if req_grad {
            Function::attach(&out, vec![self_t.clone()], UnaryGradFn { op, active });
        }
        out
    }

    pub fn neg(self_t: &Tensor) -> Tensor {
        Self::unary_op(self_t, UnaryOp::Neg)
    }
    pub fn relu(self_t: &Tensor) -> Tensor {
        Self::unary_op(self_t, UnaryOp::ReLU)
    }
}
