use crate::math::matrix::Matrix;

/// Categorical cross-entropy loss for use with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-15;

impl CrossEntropyLoss {
    /// Mean cross-entropy over the rows of a batch:
    ///   L = -(1/N) * sum_n sum_i expected[n][i] * ln(predicted[n][i] + eps)
    ///
    /// `predicted`: softmax probabilities, shape [N, n_classes]
    /// `expected` : one-hot targets, same shape
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        if predicted.rows == 0 {
            return 0.0;
        }
        let total: f64 = predicted.data.iter().zip(&expected.data)
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum();
        total / predicted.rows as f64
    }

    /// Gradient of the combined Softmax + cross-entropy w.r.t. the pre-softmax
    /// logits, one row per sample:
    ///   dL/dz = predicted - expected
    ///
    /// Not divided by N: the update uses the batch-summed gradient.
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        predicted - expected
    }
}

/// One-hot encodes class indices into an `N x n_classes` matrix.
///
/// Callers check `label < n_classes` beforehand.
pub fn one_hot(labels: &[usize], n_classes: usize) -> Matrix {
    let mut m = Matrix::zeros(labels.len(), n_classes);
    for (row, &label) in labels.iter().enumerate() {
        m.data[row * n_classes + label] = 1.0;
    }
    m
}
