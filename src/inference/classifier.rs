use std::path::Path;

use image::DynamicImage;
use log::{info, warn};
use serde::Serialize;

use crate::data::catalog::Catalog;
use crate::data::vectorize::{vectorize, vectorize_path};
use crate::error::{Error, Result};
use crate::eval::metrics::{report, ClassificationReport};
use crate::math::matrix::Matrix;
use crate::network::metadata::ModelMetadata;
use crate::network::network::NeuralNetwork;

/// Outcome of classifying one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub class_index: usize,
    pub class_name: String,
    /// Softmax probability of the predicted class.
    pub confidence: f64,
}

/// A trained network together with the metadata needed to feed it images.
#[derive(Debug, Clone)]
pub struct Classifier {
    network: NeuralNetwork,
    metadata: ModelMetadata,
}

impl Classifier {
    /// Fails with `ModelLoad` if the network carries no metadata.
    pub fn from_network(network: NeuralNetwork) -> Result<Classifier> {
        match network.metadata.clone() {
            Some(metadata) => Ok(Classifier { network, metadata }),
            None => Err(Error::model_load("<memory>", "network has no metadata")),
        }
    }

    /// Loads a checkpoint written by `NeuralNetwork::save` during training.
    pub fn load(path: impl AsRef<Path>) -> Result<Classifier> {
        let path = path.as_ref();
        let network = NeuralNetwork::load(path)?;
        match network.metadata.clone() {
            Some(metadata) => Ok(Classifier { network, metadata }),
            None => Err(Error::model_load(
                path,
                "checkpoint has no metadata (class names, image size, normalization)",
            )),
        }
    }

    pub fn network(&self) -> &NeuralNetwork {
        &self.network
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn classify(&self, image: &DynamicImage) -> Result<Prediction> {
        let features = vectorize(image, self.metadata.image_size, Some(&self.metadata.normalization))?;
        self.predict_features(&features)
    }

    pub fn classify_path(&self, path: impl AsRef<Path>) -> Result<Prediction> {
        let features = vectorize_path(
            path.as_ref(),
            self.metadata.image_size,
            Some(&self.metadata.normalization),
        )?;
        self.predict_features(&features)
    }

    fn predict_features(&self, features: &[f64]) -> Result<Prediction> {
        let (class_index, confidence) = self.network.predict_one(features)?;
        let class_name = self.metadata.classes.name(class_index)
            .ok_or_else(|| Error::Shape(format!("no class name for output {}", class_index)))?
            .to_string();
        Ok(Prediction { class_index, class_name, confidence })
    }

    /// Scores the model against a labelled catalog. Images are used as is,
    /// without augmentation.
    ///
    /// Records that cannot be loaded, or whose class the model does not
    /// know, are logged and skipped.
    pub fn evaluate(&self, catalog: &Catalog) -> Result<ClassificationReport> {
        let stats = &self.metadata.normalization;
        let mut rows: Vec<Vec<f64>> = Vec::new();
        let mut labels: Vec<usize> = Vec::new();

        for record in &catalog.records {
            let label = match self.metadata.classes.index_of(&record.class_name) {
                Some(label) => label,
                None => {
                    warn!("class '{}' of {} is unknown to the model, skipping", record.class_name, record.file_name);
                    continue;
                }
            };
            let path = catalog.resolve(record);
            match vectorize_path(&path, self.metadata.image_size, Some(stats)) {
                Ok(features) => {
                    rows.push(features);
                    labels.push(label);
                }
                Err(e) => warn!("{}, skipping", e),
            }
        }

        if rows.is_empty() {
            return Err(Error::EmptyDataset("no catalog image could be evaluated".into()));
        }

        let (predicted, _) = self.network.predict(&Matrix::from_rows(&rows))?;
        let result = report(&labels, &predicted, &self.metadata.classes);
        info!("evaluated {} images, accuracy {:.3}%", labels.len(), result.accuracy * 100.0);
        Ok(result)
    }
}
