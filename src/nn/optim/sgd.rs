use crate::nn::optim::Optimizer;
use crate::tensor::Tensor;

/// Stochastic Gradient Descent optimizer with optional momentum
///
/// Update rule:
/// - Without momentum: θ ← θ - lr·∇θ
/// - With momentum: v ← β·v - lr·∇θ, θ ← θ + v
///
/// Momentum helps accelerate convergence and dampen oscillations.
pub struct SGD {
    params: Vec<Tensor>,
    lr: f64,
    momentum: f64,
    weight_decay: f64,
    velocity: Vec<Vec<f64>>,
}

impl SGD {
    /// Create a new SGD optimizer
    ///
    /// # Arguments
    /// * `params` - List of parameters to optimize
    /// * `lr` - Learning rate (typical: 0.01 to 0.1)
    /// * `momentum` - Momentum coefficient (typical: 0.9, or 0.0 for no momentum)
    /// * `weight_decay` - L2 penalty (typical: 1e-4, or 0.0 for none)
    pub fn new(params: Vec<Tensor>, lr: f64, momentum: f64, weight_decay: f64) -> Self {
        let velocity = if momentum > 0.0 {
            params
                .iter()
                .map(|p| vec![0.0; p.borrow().data.len()])
                .collect()
        } else {
            vec![]
        };

        SGD {
            params,
            lr,
            momentum,
            weight_decay,
            velocity,
        }
    }

    pub fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
    }

    pub fn params(&self) -> &[Tensor] {
        &self.params
    }
}

impl Optimizer for SGD {
    /// Perform one optimization step
    ///
    /// Parameters without a gradient buffer are left untouched.
    fn step(&mut self) {
        for (i, param) in self.params.iter().enumerate() {
            let mut p = param.borrow_mut();
            let Some(mut active_grad) = p.grad.clone() else {
                continue;
            };

            // Apply weight decay: grad = grad + weight_decay * param
            if self.weight_decay != 0.0 {
                for (g, theta) in active_grad.iter_mut().zip(p.data.iter()) {
                    *g += self.weight_decay * *theta;
                }
            }

            if self.momentum > 0.0 {
                // Update velocity: v = momentum·v - lr·grad
                for (v, &g) in self.velocity[i].iter_mut().zip(active_grad.iter()) {
                    *v = self.momentum * *v - self.lr * g;
                }
                // Update parameters: θ = θ + v
                for (d, &v) in p.data.iter_mut().zip(&self.velocity[i]) {
                    *d += v;
                }
            } else {
                // Simple SGD: θ = θ - lr·grad
                for (d, &g) in p.data.iter_mut().zip(active_grad.iter()) {
                    *d -= self.lr * g;
                }
            }
        }
    }

    /// Zero all parameter gradients
    ///
    /// Gradients accumulate across backward passes, so call this before each
    /// new batch.
    fn zero_grad(&self) {
        for param in &self.params {
            param.borrow_mut().zero_grad();
        }
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }
}
