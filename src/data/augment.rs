use image::{DynamicImage, Rgb, RgbImage};

/// Number of variants `augment` produces per source image.
pub const AUGMENTED_VARIANTS: usize = 7;

const BRIGHTNESS_FACTORS: [f64; 2] = [0.7, 1.3];
const CONTRAST_FACTORS: [f64; 2] = [0.7, 1.3];

/// Produces the fixed set of augmented copies of `image`, in order:
/// rotations by 90, 180 and 270 degrees counter-clockwise, a horizontal
/// flip, brightness x0.7 and x1.3, contrast x0.7 and x1.3.
pub fn augment(image: &DynamicImage) -> Vec<DynamicImage> {
    let mut out = Vec::with_capacity(AUGMENTED_VARIANTS);

    // imageops rotates clockwise.
    out.push(image.rotate270());
    out.push(image.rotate180());
    out.push(image.rotate90());

    out.push(image.fliph());

    let rgb = image.to_rgb8();
    for factor in BRIGHTNESS_FACTORS {
        out.push(DynamicImage::ImageRgb8(scale_brightness(&rgb, factor)));
    }
    for factor in CONTRAST_FACTORS {
        out.push(DynamicImage::ImageRgb8(scale_contrast(&rgb, factor)));
    }
    out
}

/// Multiplies every channel by `factor` (a blend towards black).
pub fn scale_brightness(image: &RgbImage, factor: f64) -> RgbImage {
    map_channels(image, |c| c * factor)
}

/// Pushes every channel away from (factor > 1) or towards (factor < 1) the
/// image's mean luminance.
pub fn scale_contrast(image: &RgbImage, factor: f64) -> RgbImage {
    let mean = mean_luminance(image).round();
    map_channels(image, |c| mean + factor * (c - mean))
}

/// ITU-R 601-2 luma, averaged over all pixels.
pub fn mean_luminance(image: &RgbImage) -> f64 {
    let n = (image.width() as u64 * image.height() as u64).max(1) as f64;
    let total: f64 = image
        .pixels()
        .map(|Rgb([r, g, b])| luma(*r, *g, *b))
        .sum();
    total / n
}

fn luma(r: u8, g: u8, b: u8) -> f64 {
    (r as u32 * 299 + g as u32 * 587 + b as u32 * 114) as f64 / 1000.0
}

fn map_channels<F>(image: &RgbImage, f: F) -> RgbImage
where
    F: Fn(f64) -> f64,
{
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for c in pixel.0.iter_mut() {
            *c = f(*c as f64).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
