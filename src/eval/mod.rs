pub mod metrics;

pub use metrics::{accuracy, confusion_matrix, report, ClassMetrics, ClassificationReport};
