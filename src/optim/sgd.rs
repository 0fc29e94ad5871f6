use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::{math::matrix::Matrix, layers::dense::Dense};

/// Plain gradient descent with a fixed learning rate. No momentum, no decay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    /// Rejects non-finite or non-positive learning rates.
    pub fn new(learning_rate: f64) -> Result<Sgd> {
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(Error::hyperparameter(
                "learning_rate",
                format!("must be a positive finite number, got {}", learning_rate),
            ));
        }
        Ok(Sgd { learning_rate })
    }

    /// Applies one update to a layer given its pre-computed gradients.
    pub fn step(&self, layer: &mut Dense, weights_grad: &Matrix, biases_grad: &Matrix) {
        layer.apply_gradients(weights_grad, biases_grad, self.learning_rate);
    }
}
