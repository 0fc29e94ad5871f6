//! Training settings.
//!
//! Settings can be written as a JSON file; every field is optional and falls
//! back to the defaults below.
//!
//! ```json
//! {
//!   "hidden_size": 64,
//!   "learning_rate": 0.001,
//!   "desired_error": 0.001,
//!   "image_size": { "width": 64, "height": 64 },
//!   "augment": true,
//!   "validation_fraction": 0.2,
//!   "split_seed": 42,
//!   "max_epochs": 20000
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::vectorize::ImageSize;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingSettings {
    /// Neurons in the hidden layer.
    pub hidden_size: usize,
    pub learning_rate: f64,
    /// Training stops once the loss is at or below this value.
    pub desired_error: f64,
    /// Resize target for every image.
    pub image_size: ImageSize,
    /// Add the seven augmented variants of every image.
    pub augment: bool,
    pub validation_fraction: f64,
    /// Seed for the stratified split.
    pub split_seed: u64,
    /// Seed for weight initialization; `None` draws from the OS.
    pub init_seed: Option<u64>,
    /// Optional ceiling on epochs. `None` trains until `desired_error` is
    /// reached or training is cancelled.
    pub max_epochs: Option<usize>,
    /// Emit a progress event every this many epochs (and on the first).
    pub report_every: usize,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        TrainingSettings {
            hidden_size: 64,
            learning_rate: 0.001,
            desired_error: 0.001,
            image_size: ImageSize::default(),
            augment: true,
            validation_fraction: 0.2,
            split_seed: 42,
            init_seed: None,
            max_epochs: None,
            report_every: 10,
        }
    }
}

impl TrainingSettings {
    /// Reads settings from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<TrainingSettings> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let settings: TrainingSettings = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| Error::hyperparameter("settings", format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects out-of-range values before any work starts.
    pub fn validate(&self) -> Result<()> {
        if self.hidden_size == 0 {
            return Err(Error::hyperparameter("hidden_size", "must be at least 1"));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(Error::hyperparameter(
                "learning_rate",
                format!("must be a positive finite number, got {}", self.learning_rate),
            ));
        }
        if !self.desired_error.is_finite() || self.desired_error <= 0.0 {
            return Err(Error::hyperparameter(
                "desired_error",
                format!("must be a positive finite number, got {}", self.desired_error),
            ));
        }
        if self.image_size.width == 0 || self.image_size.height == 0 {
            return Err(Error::hyperparameter("image_size", "width and height must be non-zero"));
        }
        if !(self.validation_fraction > 0.0 && self.validation_fraction < 1.0) {
            return Err(Error::hyperparameter(
                "validation_fraction",
                format!("must lie strictly between 0 and 1, got {}", self.validation_fraction),
            ));
        }
        if self.max_epochs == Some(0) {
            return Err(Error::hyperparameter("max_epochs", "must be at least 1 when set"));
        }
        if self.report_every == 0 {
            return Err(Error::hyperparameter("report_every", "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = TrainingSettings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.hidden_size, 64);
        assert_eq!(s.image_size, ImageSize::new(64, 64));
        assert_eq!(s.max_epochs, None);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let s: TrainingSettings = serde_json::from_str(r#"{"hidden_size": 16, "max_epochs": 500}"#).unwrap();
        assert_eq!(s.hidden_size, 16);
        assert_eq!(s.max_epochs, Some(500));
        assert_eq!(s.learning_rate, 0.001);
        assert!(s.augment);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_json::from_str::<TrainingSettings>(r#"{"hiden_size": 16}"#).is_err());
    }

    #[test]
    fn non_numeric_value_in_file_is_invalid_hyperparameter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"learning_rate": "fast"}"#).unwrap();
        assert!(matches!(
            TrainingSettings::load_json(&path),
            Err(Error::InvalidHyperparameter { .. })
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cases: Vec<(&str, TrainingSettings)> = vec![
            ("hidden_size", TrainingSettings { hidden_size: 0, ..Default::default() }),
            ("learning_rate", TrainingSettings { learning_rate: f64::NAN, ..Default::default() }),
            ("desired_error", TrainingSettings { desired_error: -1.0, ..Default::default() }),
            ("image_size", TrainingSettings { image_size: ImageSize::new(0, 8), ..Default::default() }),
            ("validation_fraction", TrainingSettings { validation_fraction: 1.0, ..Default::default() }),
            ("max_epochs", TrainingSettings { max_epochs: Some(0), ..Default::default() }),
        ];
        for (field, settings) in cases {
            match settings.validate() {
                Err(Error::InvalidHyperparameter { name, .. }) => assert_eq!(name, field),
                other => panic!("{} accepted: {:?}", field, other),
            }
        }
    }
}
