//! Image artifacts written for each generated item.
//!
//! Each item gets a full-size and a thumbnail rendition, named
//! `<id>.<ext>` and `<id>-thumb.<ext>` inside the images directory.

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};

use crate::config::GenerationConfig;

/// Target renditions and encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionSpec {
    pub full_px: u32,
    pub thumb_px: u32,
    pub extension: String,
}

impl From<&GenerationConfig> for RenditionSpec {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            full_px: config.full_px,
            thumb_px: config.thumb_px,
            extension: config.extension.clone(),
        }
    }
}

/// Paths and on-disk byte sizes of the two renditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifacts {
    pub full_path: PathBuf,
    pub thumb_path: PathBuf,
    pub full_size: u64,
    pub thumb_size: u64,
}

pub fn full_path(dir: &Path, id: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", id, extension))
}

pub fn thumb_path(dir: &Path, id: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}-thumb.{}", id, extension))
}

/// Decode a base64 image payload.
pub fn decode_payload(b64: &str) -> Result<DynamicImage> {
    let bytes = STANDARD
        .decode(b64.trim())
        .context("Image payload is not valid base64")?;
    image::load_from_memory(&bytes).context("Image payload could not be decoded")
}

/// Resize `img` to both renditions and write them for item `id`.
pub fn write_renditions(
    img: &DynamicImage,
    dir: &Path,
    id: &str,
    spec: &RenditionSpec,
) -> Result<SavedArtifacts> {
    let format = ImageFormat::from_extension(&spec.extension)
        .ok_or_else(|| anyhow!("Unsupported image extension: {}", spec.extension))?;

    let full_path = full_path(dir, id, &spec.extension);
    let thumb_path = thumb_path(dir, id, &spec.extension);

    let full_size = write_rendition(img, spec.full_px, &full_path, format)?;
    let thumb_size = write_rendition(img, spec.thumb_px, &thumb_path, format)?;

    Ok(SavedArtifacts {
        full_path,
        thumb_path,
        full_size,
        thumb_size,
    })
}

fn write_rendition(img: &DynamicImage, px: u32, path: &Path, format: ImageFormat) -> Result<u64> {
    let resized = img.resize_exact(px, px, FilterType::Lanczos3);
    // JPEG has no alpha channel; generated photos never use one anyway.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
    rgb.save_with_format(path, format)
        .with_context(|| format!("Failed to write image: {}", path.display()))?;

    let size = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat image: {}", path.display()))?
        .len();
    Ok(size)
}
