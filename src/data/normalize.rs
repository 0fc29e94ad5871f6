use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Lower bound for every per-feature standard deviation.
pub const STD_FLOOR: f64 = 1e-8;

/// Per-feature z-score statistics, computed once over the training matrix and
/// reused verbatim at inference time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl NormalizationStats {
    /// Column means and population standard deviations of `features`.
    ///
    /// Constant columns get `STD_FLOOR` instead of zero.
    pub fn compute(features: &Matrix) -> Result<NormalizationStats> {
        if features.rows == 0 {
            return Err(Error::EmptyDataset("cannot compute statistics over zero rows".into()));
        }
        let n = features.rows as f64;

        let mut mean = vec![0.0; features.cols];
        for row in features.rows_iter() {
            for (m, &x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; features.cols];
        for row in features.rows_iter() {
            for ((v, &x), &m) in var.iter_mut().zip(row).zip(&mean) {
                *v += (x - m) * (x - m);
            }
        }
        let std = var.into_iter()
            .map(|v| (v / n).sqrt().max(STD_FLOOR))
            .collect();

        Ok(NormalizationStats { mean, std })
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len != self.len() {
            return Err(Error::Shape(format!(
                "feature vector has {} values, normalization stats expect {}",
                len,
                self.len()
            )));
        }
        Ok(())
    }

    /// `(v - mean) / std` in place.
    pub fn normalize(&self, features: &mut [f64]) -> Result<()> {
        self.check_len(features.len())?;
        for ((x, m), s) in features.iter_mut().zip(&self.mean).zip(&self.std) {
            *x = (*x - m) / s;
        }
        Ok(())
    }

    /// Inverse of `normalize`: `v * std + mean` in place.
    pub fn denormalize(&self, features: &mut [f64]) -> Result<()> {
        self.check_len(features.len())?;
        for ((x, m), s) in features.iter_mut().zip(&self.mean).zip(&self.std) {
            *x = *x * s + m;
        }
        Ok(())
    }

    /// Returns a normalized copy of every row.
    pub fn normalize_matrix(&self, features: &Matrix) -> Result<Matrix> {
        self.check_len(features.cols)?;
        let mut out = features.clone();
        for row in out.data.chunks_exact_mut(features.cols.max(1)) {
            for ((x, m), s) in row.iter_mut().zip(&self.mean).zip(&self.std) {
                *x = (*x - m) / s;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        Matrix::from_rows(&[
            vec![0.0, 0.5, 0.2],
            vec![1.0, 0.5, 0.4],
            vec![0.5, 0.5, 0.9],
        ])
    }

    #[test]
    fn computes_population_statistics() {
        let stats = NormalizationStats::compute(&sample()).unwrap();
        assert!((stats.mean[0] - 0.5).abs() < 1e-12);
        // population std of {0, 1, 0.5}
        assert!((stats.std[0] - (1.0f64 / 6.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn constant_feature_is_floored() {
        let stats = NormalizationStats::compute(&sample()).unwrap();
        assert_eq!(stats.std[1], STD_FLOOR);
        let mut v = vec![0.3, 0.5, 0.1];
        stats.normalize(&mut v).unwrap();
        assert!(v.iter().all(|x| x.is_finite()));
        assert_eq!(v[1], 0.0);
    }

    #[test]
    fn normalize_then_denormalize_round_trips() {
        let m = sample();
        let stats = NormalizationStats::compute(&m).unwrap();
        for row in m.rows_iter() {
            let mut v = row.to_vec();
            stats.normalize(&mut v).unwrap();
            stats.denormalize(&mut v).unwrap();
            for (a, b) in v.iter().zip(row) {
                assert!((a - b).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn normalized_matrix_has_zero_mean_columns() {
        let m = sample();
        let stats = NormalizationStats::compute(&m).unwrap();
        let z = stats.normalize_matrix(&m).unwrap();
        let sums = z.sum_rows();
        assert!(sums.data.iter().all(|s| s.abs() < 1e-9));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let stats = NormalizationStats::compute(&sample()).unwrap();
        let mut v = vec![0.0; 2];
        assert!(matches!(stats.normalize(&mut v), Err(Error::Shape(_))));
    }

    #[test]
    fn zero_rows_is_an_empty_dataset() {
        assert!(matches!(
            NormalizationStats::compute(&Matrix::zeros(0, 3)),
            Err(Error::EmptyDataset(_))
        ));
    }
}
