use crate::autograd::Function;
use crate::error::{GradError, Result};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Type alias for a reference-counted, interior-mutable tensor.
///
/// Graph nodes hold `Rc` clones of their inputs so a parameter can feed many
/// operations, while `RefCell` lets the backward pass accumulate into the
/// gradient buffer of a tensor that is shared across the graph.
///
/// This is single-threaded only: one training step builds and consumes its
/// graph on one call stack.
pub type Tensor = Rc<RefCell<RawTensor>>;

// ===== RAW TENSOR STRUCTURE =====

/// The core tensor structure containing data and gradient tracking
///
/// Fields:
/// - `data`: flat values in row-major order, `len == shape.product()`
/// - `grad`: accumulated gradient, allocated (all zero) iff `requires_grad`
/// - `shape` / `strides`: fixed at construction
/// - `producer`: the operation that created this tensor; `None` for leaves
pub struct RawTensor {
    pub data: Vec<f64>,
    pub grad: Option<Vec<f64>>,
    pub(crate) shape: Vec<usize>,
    pub(crate) strides: Vec<usize>,
    pub(crate) requires_grad: bool,
    pub(crate) producer: Option<Function>,
}

impl fmt::Debug for RawTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("requires_grad", &self.requires_grad)
            .field("producer", &self.producer.as_ref().map(Function::name))
            .finish()
    }
}

impl fmt::Display for RawTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor(data={:?}, shape={:?}, dtype={}, device={})",
            self.data,
            self.shape,
            self.dtype(),
            self.device()
        )
    }
}

// ===== TENSOR CONSTRUCTORS =====
impl RawTensor {
    /// Create a new leaf tensor from flat row-major data and a shape
    ///
    /// # Errors
    /// `ShapeMismatch` if `data.len()` differs from the product of `shape`, or
    /// if that product does not fit in `usize`.
    pub fn from_flat(data: Vec<f64>, shape: &[usize], requires_grad: bool) -> Result<Tensor> {
        match Self::checked_size(shape) {
            Some(size) if size == data.len() => Ok(Self::from_op(data, shape, requires_grad)),
            _ => Err(GradError::ShapeMismatch {
                op: "from_flat",
                lhs: shape.to_vec(),
                rhs: vec![data.len()],
            }),
        }
    }

    /// Create a tensor filled with ones
    ///
    /// # Errors
    /// `ShapeMismatch` if the element count overflows `usize`.
    pub fn ones(shape: &[usize], requires_grad: bool) -> Result<Tensor> {
        let size = Self::size_for(shape, "ones")?;
        Ok(Self::from_op(vec![1.0; size], shape, requires_grad))
    }

    /// Create a tensor filled with zeros that does not track gradients
    ///
    /// # Errors
    /// `ShapeMismatch` if the element count overflows `usize`.
    pub fn zeros(shape: &[usize]) -> Result<Tensor> {
        let size = Self::size_for(shape, "zeros")?;
        Ok(Self::from_op(vec![0.0; size], shape, false))
    }

    /// Create a shape `[1]` tensor holding `value`
    pub fn scalar(value: f64, requires_grad: bool) -> Tensor {
        Self::from_op(vec![value], &[1], requires_grad)
    }

    /// Build a tensor whose data length is already known to match `shape`.
    pub(crate) fn from_op(data: Vec<f64>, shape: &[usize], requires_grad: bool) -> Tensor {
        debug_assert_eq!(data.len(), shape.iter().product::<usize>());
        let grad = requires_grad.then(|| vec![0.0; data.len()]);
        let raw = RawTensor {
            data,
            grad,
            shape: shape.to_vec(),
            strides: Self::compute_strides(shape),
            requires_grad,
            producer: None,
        };
        Rc::new(RefCell::new(raw))
    }

    /// Element count of `shape`; `None` when the product overflows.
    pub fn checked_size(shape: &[usize]) -> Option<usize> {
        shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }

    fn size_for(shape: &[usize], op: &'static str) -> Result<usize> {
        Self::checked_size(shape).ok_or_else(|| GradError::ShapeMismatch {
            op,
            lhs: shape.to_vec(),
            rhs: Vec::new(),
        })
    }

    /// Row-major strides: the last axis is contiguous.
    pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
        let mut strides = vec![0; shape.len()];
        let mut acc = 1;
        for (stride, &dim) in strides.iter_mut().zip(shape).rev() {
            *stride = acc;
            acc *= dim;
        }
        strides
    }
}

// ===== INTROSPECTION =====
impl RawTensor {
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// A leaf has no producing operation (parameters and raw inputs).
    pub fn is_leaf(&self) -> bool {
        self.producer.is_none()
    }

    pub fn producer(&self) -> Option<&Function> {
        self.producer.as_ref()
    }

    pub fn dtype(&self) -> &'static str {
        "float64"
    }

    pub fn device(&self) -> &'static str {
        "cpu"
    }

    /// Convert a multi-index into an offset into `data`.
    pub fn flat_index(&self, index: &[usize]) -> Result<usize> {
        let in_bounds = index.len() == self.shape.len()
            && index.iter().zip(&self.shape).all(|(&i, &dim)| i < dim);
        if !in_bounds {
            return Err(GradError::IndexOutOfBounds {
                index: index.to_vec(),
                shape: self.shape.clone(),
            });
        }
        Ok(index.iter().zip(&self.strides).map(|(i, s)| i * s).sum())
    }

    pub fn get(&self, index: &[usize]) -> Result<f64> {
        let offset = self.flat_index(index)?;
        Ok(self.data[offset])
    }

    /// Overwrite one element.
    ///
    /// Backward rules hold their own copies of operand values, so writing to
    /// a tensor after it has fed an operation does not change that
    /// operation's gradients.
    pub fn set(&mut self, index: &[usize], value: f64) -> Result<()> {
        let offset = self.flat_index(index)?;
        self.data[offset] = value;
        Ok(())
    }

    /// Reset every gradient entry to 0.0; no-op when gradients are not tracked.
    pub fn zero_grad(&mut self) {
        if let Some(grad) = self.grad.as_mut() {
            grad.fill(0.0);
        }
    }

    /// Add `contribution` element-wise into the gradient buffer.
    pub(crate) fn accumulate_grad(&mut self, contribution: &[f64]) {
        let size = self.data.len();
        let grad = self.grad.get_or_insert_with(|| vec![0.0; size]);
        debug_assert_eq!(grad.len(), contribution.len());
        for (g, c) in grad.iter_mut().zip(contribution) {
            *g += c;
        }
    }
}

// ===== TRAIT-BASED API =====

/// Public trait for tensor operations
///
/// This provides a more ergonomic API: `a.mul(&b)?` instead of
/// `RawTensor::mul(&a, &b)?`.
pub trait TensorOps {
    // Binary ops
    fn add(&self, other: &Tensor) -> Result<Tensor>;
    fn sub(&self, other: &Tensor) -> Result<Tensor>;
    fn mul(&self, other: &Tensor) -> Result<Tensor>;
    fn div(&self, other: &Tensor) -> Result<Tensor>;

    // Unary ops
    fn neg(&self) -> Tensor;
    fn relu(&self) -> Tensor;

    // Reduce ops
    fn sum(&self) -> Result<Tensor>;
    fn mean(&self) -> Result<Tensor>;

    // Gradient ops
    fn backward(&self) -> Result<()>;
    fn grad(&self) -> Option<Vec<f64>>;
    fn zero_grad(&self);

    // Accessors
    fn values(&self) -> Vec<f64>;
    fn shape(&self) -> Vec<usize>;
    fn size(&self) -> usize;
    fn item(&self) -> f64;
}

impl TensorOps for Tensor {
    fn add(&self, other: &Tensor) -> Result<Tensor> {
        RawTensor::add(self, other)
    }
    fn sub(&self, other: &Tensor) -> Result<Tensor> {
        RawTensor::sub(self, other)
    }
    fn mul(&self, other: &Tensor) -> Result<Tensor> {
        RawTensor::mul(self, other)
    }
    fn div(&self, other: &Tensor) -> Result<Tensor> {
        RawTensor::div(self, other)
    }

    fn neg(&self) -> Tensor {
        RawTensor::neg(self)
    }
    fn relu(&self) -> Tensor {
        RawTensor::relu(self)
    }

    fn sum(&self) -> Result<Tensor> {
        RawTensor::sum(self)
    }
    fn mean(&self) -> Result<Tensor> {
        RawTensor::mean(self)
    }

    fn backward(&self) -> Result<()> {
        RawTensor::backward(self)
    }
    fn grad(&self) -> Option<Vec<f64>> {
        self.borrow().grad.clone()
    }
    fn zero_grad(&self) {
        self.borrow_mut().zero_grad();
    }

    fn values(&self) -> Vec<f64> {
        self.borrow().data.clone()
    }
    fn shape(&self) -> Vec<usize> {
        self.borrow().shape.clone()
    }
    fn size(&self) -> usize {
        self.borrow().size()
    }
    /// First element, meant for shape `[1]` losses.
    ///
    /// Returns `f64::NAN` for an empty tensor rather than panicking.
    fn item(&self) -> f64 {
        self.borrow().data.first().copied().unwrap_or(f64::NAN)
    }
}
