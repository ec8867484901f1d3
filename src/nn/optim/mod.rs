pub mod sgd;

pub use sgd::SGD;

/// Consumes `(values, gradient)` pairs of each parameter and updates the
/// values in place, outside of any graph.
pub trait Optimizer {
    fn step(&mut self);
    fn zero_grad(&self);
    fn learning_rate(&self) -> f64;
}
