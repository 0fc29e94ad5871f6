use serde::{Deserialize, Serialize};

use crate::data::normalize::NormalizationStats;
use crate::data::vectorize::ImageSize;
use crate::data::vocabulary::ClassVocabulary;

/// Everything besides the weights needed to turn an image into a prediction.
/// Stored in the checkpoint next to the parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default)]
    pub description: Option<String>,
    /// Resize target the network was trained on.
    pub image_size: ImageSize,
    /// Class labels for the output layer, in index order.
    pub classes: ClassVocabulary,
    /// Statistics used to normalize training inputs.
    pub normalization: NormalizationStats,
}
