use crate::math::matrix::Matrix;

/// Element-wise ReLU.
pub fn relu(z: &Matrix) -> Matrix {
    z.map(|x| if x > 0.0 { x } else { 0.0 })
}

/// ReLU derivative evaluated on the pre-activation: 1 where `z > 0`, else 0.
pub fn relu_derivative(z: &Matrix) -> Matrix {
    z.map(|x| if x > 0.0 { 1.0 } else { 0.0 })
}

/// Row-wise softmax.
///
/// The row maximum is subtracted before exponentiating, so every exponent is
/// `<= 0` and the largest term is exactly 1. Rows therefore never overflow and
/// the denominator is never below 1.
pub fn softmax(logits: &Matrix) -> Matrix {
    let mut out = logits.clone();
    for row in out.data.chunks_exact_mut(logits.cols.max(1)) {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0;
        for x in row.iter_mut() {
            *x = (*x - max).exp();
            sum += *x;
        }
        for x in row.iter_mut() {
            *x /= sum;
        }
    }
    out
}
