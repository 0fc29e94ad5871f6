use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

/// Fully connected layer: `weights` is `input_size x size`, `biases` is `1 x size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    pub weights: Matrix,
    pub biases: Matrix,
}

impl Dense {
    /// He-initialized weights, zero biases.
    pub fn new<R: Rng + ?Sized>(input_size: usize, size: usize, rng: &mut R) -> Dense {
        Dense {
            weights: Matrix::he(input_size, size, rng),
            biases: Matrix::zeros(1, size),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    pub fn size(&self) -> usize {
        self.weights.cols
    }

    /// z = X·W + b for a whole batch (one sample per row).
    pub fn pre_activation(&self, inputs: &Matrix) -> Matrix {
        (inputs * &self.weights).add_row(&self.biases)
    }

    /// Computes gradient adjustments. Returns (weights_grad, biases_grad).
    ///
    /// `layer_delta` is dL/dz for this layer, one row per sample; the
    /// returned gradients are summed over the batch.
    pub fn compute_gradients(&self, layer_delta: &Matrix, inputs: &Matrix) -> (Matrix, Matrix) {
        let weights_grad = &inputs.transpose() * layer_delta;
        let biases_grad = layer_delta.sum_rows();
        (weights_grad, biases_grad)
    }

    /// Applies pre-computed gradients scaled by lr.
    pub fn apply_gradients(&mut self, weights_grad: &Matrix, biases_grad: &Matrix, lr: f64) {
        self.weights.sub_scaled(weights_grad, lr);
        self.biases.sub_scaled(biases_grad, lr);
    }
}
