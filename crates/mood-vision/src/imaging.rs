//! Image preparation for the face-crop fallback.
//!
//! Orientation variants, contrast normalization and padded face crops.
//! Pixel work goes through `imageproc` on top of `image` buffers.

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb};
use imageproc::{contrast, map};
use mood_models::{FaceRegion, ImageVariant};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{VisionError, VisionResult};

/// Produce the given orientation of `image`.
///
/// `Cropped` has no geometric meaning here and returns the image unchanged.
pub fn orient(image: &DynamicImage, variant: ImageVariant) -> DynamicImage {
    match variant {
        ImageVariant::Identity | ImageVariant::Cropped => image.clone(),
        ImageVariant::Rotated90 => image.rotate90(),
        ImageVariant::Rotated180 => image.rotate180(),
        ImageVariant::Rotated270 => image.rotate270(),
    }
}

/// 8-bit grayscale with equalized histogram, as fed to face detectors.
pub fn normalized_gray(image: &DynamicImage) -> GrayImage {
    contrast::equalize_histogram(&bt601_gray(image))
}

/// Grayscale with BT.601 weights, matching OpenCV `COLOR_RGB2GRAY`.
///
/// Haar cascades are trained on this conversion; `DynamicImage::to_luma8`
/// uses Rec.709 weights instead.
pub fn bt601_gray(image: &DynamicImage) -> GrayImage {
    map::map_colors(&image.to_rgb8(), |Rgb([r, g, b])| {
        let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000;
        Luma([luma.min(255) as u8])
    })
}

/// Region of `image` covered by `face` after padding, clipped to bounds.
pub fn padded_crop_region(image: &DynamicImage, face: &FaceRegion, padding_ratio: f64) -> FaceRegion {
    face.expand(padding_ratio, image.width(), image.height())
}

/// Crop `region` out of `image` and write it to a temporary PNG in `dir`.
///
/// The file is removed when the returned handle drops.
pub fn write_crop(image: &DynamicImage, region: &FaceRegion, dir: &Path) -> VisionResult<NamedTempFile> {
    if region.is_empty() {
        return Err(VisionError::invalid_image("empty crop region"));
    }

    let crop = image.crop_imm(region.x, region.y, region.width, region.height);
    let file = tempfile::Builder::new()
        .prefix("mood-crop-")
        .suffix(".png")
        .tempfile_in(dir)?;

    crop.save_with_format(file.path(), ImageFormat::Png)?;
    Ok(file)
}
