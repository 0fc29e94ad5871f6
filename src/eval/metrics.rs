use std::fmt;

use serde::{Serialize, Deserialize};

use crate::data::vocabulary::ClassVocabulary;

/// Guards every ratio against a zero denominator.
const EPS: f64 = 1e-15;

/// Fraction of positions where `y_pred` equals `y_true`; 0 for empty input.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// `matrix[true][predicted]` counts. Out-of-range indices are ignored.
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Vec<Vec<usize>> {
    let mut matrix = vec![vec![0usize; n_classes]; n_classes];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        if t < n_classes && p < n_classes {
            matrix[t][p] += 1;
        }
    }
    matrix
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class_name: String,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    /// Number of true occurrences of the class.
    pub support: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub classes: Vec<ClassMetrics>,
    pub confusion: Vec<Vec<usize>>,
}

/// Per-class precision, recall and F1 for every class in `vocabulary`.
pub fn report(y_true: &[usize], y_pred: &[usize], vocabulary: &ClassVocabulary) -> ClassificationReport {
    let classes = vocabulary.names().iter().enumerate()
        .map(|(idx, name)| {
            let mut tp = 0;
            let mut fp = 0;
            let mut fn_ = 0;
            for (&t, &p) in y_true.iter().zip(y_pred) {
                match (t == idx, p == idx) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }
            let precision = tp as f64 / (tp as f64 + fp as f64 + EPS);
            let recall = tp as f64 / (tp as f64 + fn_ as f64 + EPS);
            let f1 = 2.0 * precision * recall / (precision + recall + EPS);
            ClassMetrics {
                class_name: name.clone(),
                true_positives: tp,
                false_positives: fp,
                false_negatives: fn_,
                support: tp + fn_,
                precision,
                recall,
                f1,
            }
        })
        .collect();

    ClassificationReport {
        accuracy: accuracy(y_true, y_pred),
        classes,
        confusion: confusion_matrix(y_true, y_pred, vocabulary.len()),
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<20} {:>9} {:>9} {:>9} {:>8}", "class", "precision", "recall", "f1", "support")?;
        for c in &self.classes {
            writeln!(
                f,
                "{:<20} {:>9.4} {:>9.4} {:>9.4} {:>8}",
                c.class_name, c.precision, c.recall, c.f1, c.support
            )?;
        }
        write!(f, "accuracy: {:.3}%", self.accuracy * 100.0)
    }
}
