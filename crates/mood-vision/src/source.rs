//! Decoded input images.
//!
//! Backends read images from disk while the crop fallback needs the decoded
//! raster, so a `SourceImage` carries both. Images built from uploaded bytes
//! own a temporary file that is removed on drop.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::DynamicImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{VisionError, VisionResult};

/// A decoded image ready for analysis.
pub struct SourceImage {
    path: PathBuf,
    image: DynamicImage,
    _upload: Option<NamedTempFile>,
}

impl SourceImage {
    /// Open and decode an image file.
    pub fn open(path: impl AsRef<Path>) -> VisionResult<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| {
            VisionError::invalid_image(format!("cannot decode {}: {}", path.display(), e))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            image,
            _upload: None,
        })
    }

    /// Decode raw image bytes, persisting them to a temp file in `scratch_dir`.
    pub fn from_bytes(bytes: &[u8], scratch_dir: &Path) -> VisionResult<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| VisionError::invalid_image(format!("cannot decode upload: {}", e)))?;

        let mut upload = tempfile::Builder::new()
            .prefix("mood-upload-")
            .tempfile_in(scratch_dir)?;
        upload.write_all(bytes)?;
        upload.flush()?;

        debug!(
            width = image.width(),
            height = image.height(),
            "Persisted upload to {}",
            upload.path().display()
        );

        Ok(Self {
            path: upload.path().to_path_buf(),
            image,
            _upload: Some(upload),
        })
    }

    /// Decode a base64 image, with or without a `data:<mime>;base64,` prefix.
    pub fn from_base64(data: &str, scratch_dir: &Path) -> VisionResult<Self> {
        let payload = match data.split_once(',') {
            Some((_, payload)) => payload,
            None => data,
        };

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| VisionError::invalid_image(format!("invalid base64 image data: {}", e)))?;

        Self::from_bytes(&bytes, scratch_dir)
    }

    /// Path backends read the image from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("path", &self.path)
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .finish()
    }
}
