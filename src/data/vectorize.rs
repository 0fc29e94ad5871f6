//! Image to feature vector conversion.
//!
//! Images are resized to a fixed target, converted to RGB and flattened as
//! R, G, B, ... per pixel in row-major order, scaled from [0, 255] to [0, 1].

use std::path::Path;

use image::{imageops::FilterType, DynamicImage};
use serde::{Serialize, Deserialize};

use crate::data::normalize::NormalizationStats;
use crate::error::{Error, Result};

pub const CHANNELS: usize = 3;

/// Canonical resize target. The network's input size is
/// `width * height * CHANNELS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> ImageSize {
        ImageSize { width, height }
    }

    pub fn feature_len(&self) -> usize {
        self.width as usize * self.height as usize * CHANNELS
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        ImageSize { width: 64, height: 64 }
    }
}

/// Resizes to `size` with Lanczos3 unless the image already has that size.
pub fn resize_to(image: &DynamicImage, size: ImageSize) -> DynamicImage {
    if image.width() == size.width && image.height() == size.height {
        image.clone()
    } else {
        image.resize_exact(size.width, size.height, FilterType::Lanczos3)
    }
}

/// Converts an image into a feature vector of length `size.feature_len()`.
///
/// Without `stats` the values are the raw [0, 1] channel intensities; with
/// `stats` they are z-scored feature by feature.
pub fn vectorize(
    image: &DynamicImage,
    size: ImageSize,
    stats: Option<&NormalizationStats>,
) -> Result<Vec<f64>> {
    if size.width == 0 || size.height == 0 {
        return Err(Error::ImageDecode {
            path: "<memory>".into(),
            reason: format!("cannot resize to {}x{}", size.width, size.height),
        });
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::ImageDecode {
            path: "<memory>".into(),
            reason: "image has no pixels".into(),
        });
    }

    let rgb = resize_to(image, size).to_rgb8();
    let mut features: Vec<f64> = rgb
        .pixels()
        .flat_map(|p| p.0.iter().map(|&c| c as f64 / 255.0))
        .collect();

    if let Some(stats) = stats {
        stats.normalize(&mut features)?;
    }
    Ok(features)
}

/// Decodes an image file.
pub fn open_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| Error::ImageDecode {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Decodes `path` and vectorizes it; decode failures carry the file path.
pub fn vectorize_path(
    path: &Path,
    size: ImageSize,
    stats: Option<&NormalizationStats>,
) -> Result<Vec<f64>> {
    let image = open_image(path)?;
    vectorize(&image, size, stats).map_err(|e| match e {
        Error::ImageDecode { reason, .. } => Error::ImageDecode {
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })
}
