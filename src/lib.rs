pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod inference;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use network::{ModelMetadata, NeuralNetwork};
pub use optim::sgd::Sgd;
pub use config::TrainingSettings;
pub use data::{Catalog, CatalogRecord, ClassVocabulary, Dataset, DatasetBuilder, ImageSize, NormalizationStats};
pub use error::{Error, Result};
pub use eval::ClassificationReport;
pub use inference::{Classifier, Prediction};
pub use train::{
    train_classifier, train_loop, EpochStats, StopReason, TrainConfig, TrainOptions, TrainedClassifier,
    TrainingOutcome,
};
