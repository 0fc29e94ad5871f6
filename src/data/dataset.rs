use log::{info, warn};

use crate::data::augment::augment;
use crate::data::catalog::Catalog;
use crate::data::normalize::NormalizationStats;
use crate::data::vectorize::{open_image, resize_to, vectorize, ImageSize};
use crate::data::vocabulary::ClassVocabulary;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Raw features (scaled to [0, 1], not yet normalized) plus everything
/// derived from them during the build.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: Matrix,
    pub labels: Vec<usize>,
    pub vocabulary: ClassVocabulary,
    pub stats: NormalizationStats,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Features z-scored with the dataset's own statistics.
    pub fn normalized_features(&self) -> Result<Matrix> {
        self.stats.normalize_matrix(&self.features)
    }
}

/// Turns a catalog into a feature matrix.
#[derive(Debug, Clone, Copy)]
pub struct DatasetBuilder {
    pub image_size: ImageSize,
    pub augment: bool,
}

impl DatasetBuilder {
    pub fn new(image_size: ImageSize, augment: bool) -> DatasetBuilder {
        DatasetBuilder { image_size, augment }
    }

    /// Vectorizes every usable catalog image (and its augmented variants)
    /// and computes normalization statistics over the result.
    ///
    /// Missing or undecodable images are logged and skipped. Fails with
    /// `EmptyDataset` when the catalog is empty or nothing survives.
    pub fn build(&self, catalog: &Catalog) -> Result<Dataset> {
        if catalog.is_empty() {
            return Err(Error::EmptyDataset("catalog has no records".into()));
        }

        let vocabulary = ClassVocabulary::from_names(
            catalog.records.iter().map(|r| r.class_name.as_str()),
        );

        let mut rows: Vec<Vec<f64>> = Vec::new();
        let mut labels: Vec<usize> = Vec::new();
        let mut skipped = 0usize;

        for record in &catalog.records {
            let path = catalog.resolve(record);
            if !path.exists() {
                warn!("image {} does not exist, skipping", path.display());
                skipped += 1;
                continue;
            }
            // Vocabulary was built from these same records.
            let label = match vocabulary.index_of(&record.class_name) {
                Some(label) => label,
                None => continue,
            };

            match self.vectorize_record(&path) {
                Ok(vectors) => {
                    labels.extend(std::iter::repeat(label).take(vectors.len()));
                    rows.extend(vectors);
                }
                Err(e) => {
                    warn!("{}, skipping", e);
                    skipped += 1;
                }
            }
        }

        if rows.is_empty() {
            return Err(Error::EmptyDataset(format!(
                "none of the {} catalog images could be loaded",
                catalog.len()
            )));
        }

        let features = Matrix::from_rows(&rows);
        let stats = NormalizationStats::compute(&features)?;

        info!(
            "built dataset: {} examples from {} images ({} skipped), {} classes {:?}",
            labels.len(),
            catalog.len() - skipped,
            skipped,
            vocabulary.len(),
            vocabulary.names(),
        );

        Ok(Dataset { features, labels, vocabulary, stats })
    }

    /// Base vector first, then one per augmented variant.
    fn vectorize_record(&self, path: &std::path::Path) -> Result<Vec<Vec<f64>>> {
        let image = open_image(path)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::ImageDecode {
                path: path.display().to_string(),
                reason: "image has no pixels".into(),
            });
        }
        let base = resize_to(&image, self.image_size);

        let mut vectors = vec![vectorize(&base, self.image_size, None)?];
        if self.augment {
            for variant in augment(&base) {
                vectors.push(vectorize(&variant, self.image_size, None)?);
            }
        }
        Ok(vectors)
    }
}
