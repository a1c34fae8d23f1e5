use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine};
use image::codecs::jpeg::JpegEncoder;
use tempfile::NamedTempFile;

use crate::models::CapturedImage;

const JPEG_QUALITY: u8 = 85;

/// The transferable form of one captured frame: JPEG bytes in a named
/// temporary file plus the base64 payload for inline transmission.
/// Scoped to a single invocation; the file is deleted when this drops,
/// whichever way the invocation ended.
pub struct StagedImage {
    file: NamedTempFile,
    jpeg: Vec<u8>,
    base64: String,
}

impl StagedImage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn base64(&self) -> &str {
        &self.base64
    }

    pub fn data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.base64())
    }

    pub fn file_name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "ulam.jpg".to_string())
    }
}

/// Serializes a captured frame for transmission.
pub fn stage(image: &CapturedImage) -> Result<StagedImage> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode(&image.pixels, image.width, image.height, image::ColorType::Rgb8)
        .context("JPEG encoding failed")?;

    let mut file = tempfile::Builder::new()
        .prefix("ulamlens-")
        .suffix(".jpg")
        .tempfile()
        .context("could not create staging file")?;
    file.write_all(&jpeg)
        .and_then(|_| file.flush())
        .context("could not write staging file")?;

    let base64 = general_purpose::STANDARD.encode(&jpeg);
    log::debug!(
        "📊 Staged {}x{} frame: {} JPEG bytes, {} base64 bytes",
        image.width,
        image.height,
        jpeg.len(),
        base64.len()
    );

    Ok(StagedImage { file, jpeg, base64 })
}
