use std::path::PathBuf;

use thiserror::Error;

/// Every failure the pipeline can report.
///
/// `ImageDecode` is the only variant the dataset builder swallows (it logs and
/// skips the image); the rest propagate to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not decode image '{path}': {reason}")]
    ImageDecode { path: String, reason: String },

    #[error("dataset is empty: {0}")]
    EmptyDataset(String),

    #[error("could not load model from '{path}': {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    #[error("invalid hyperparameter `{name}`: {reason}")]
    InvalidHyperparameter { name: &'static str, reason: String },

    #[error("could not read catalog '{path}': {reason}")]
    Catalog { path: PathBuf, reason: String },

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("refusing to write non-finite parameters to '{path}'")]
    NonFiniteParameters { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn hyperparameter(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidHyperparameter { name, reason: reason.into() }
    }

    pub(crate) fn model_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::ModelLoad { path: path.into(), reason: reason.to_string() }
    }
}
