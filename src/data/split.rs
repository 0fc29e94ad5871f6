use std::collections::BTreeMap;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Train / validation partitions of a labelled feature matrix.
#[derive(Debug, Clone)]
pub struct TrainValSplit {
    pub train_inputs: Matrix,
    pub train_labels: Vec<usize>,
    pub val_inputs: Matrix,
    pub val_labels: Vec<usize>,
}

/// Row indices for a stratified split: every class contributes
/// `round(count * val_fraction)` rows to validation, but at least one row and
/// never all of them when it has two or more examples. Classes with a single
/// example stay in training.
///
/// The result depends only on `labels`, `val_fraction` and `seed`.
pub fn stratified_indices(
    labels: &[usize],
    val_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(val_fraction > 0.0 && val_fraction < 1.0) {
        return Err(Error::hyperparameter(
            "validation_fraction",
            format!("must lie strictly between 0 and 1, got {}", val_fraction),
        ));
    }

    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut val = Vec::new();

    for (_, mut indices) in by_class {
        indices.shuffle(&mut rng);
        let count = indices.len();
        let n_val = if count < 2 {
            0
        } else {
            ((count as f64 * val_fraction).round() as usize).clamp(1, count - 1)
        };
        val.extend_from_slice(&indices[..n_val]);
        train.extend_from_slice(&indices[n_val..]);
    }

    train.shuffle(&mut rng);
    val.shuffle(&mut rng);
    Ok((train, val))
}

/// Splits `features` / `labels` with `stratified_indices`.
pub fn stratified_split(
    features: &Matrix,
    labels: &[usize],
    val_fraction: f64,
    seed: u64,
) -> Result<TrainValSplit> {
    if features.rows != labels.len() {
        return Err(Error::Shape(format!(
            "{} feature rows but {} labels",
            features.rows,
            labels.len()
        )));
    }
    let (train, val) = stratified_indices(labels, val_fraction, seed)?;
    Ok(TrainValSplit {
        train_inputs: features.select_rows(&train),
        train_labels: train.iter().map(|&i| labels[i]).collect(),
        val_inputs: features.select_rows(&val),
        val_labels: val.iter().map(|&i| labels[i]).collect(),
    })
}
