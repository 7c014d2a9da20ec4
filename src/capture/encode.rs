//! Encoding a surface into a data-URL image payload.

use crate::config::{within_pixel_budget, ImageFormat, Settings};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ImageError, RgbImage};
use thiserror::Error;

/// Errors raised while encoding a capture.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("surface is empty")]
    EmptySurface,
    #[error("photo of {width}x{height} pixels exceeds the allocation limit")]
    TooLarge { width: u32, height: u32 },
    #[error("image encoding failed: {0}")]
    Image(#[from] ImageError),
}

/// An encoded still image, ready for transport.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    format: ImageFormat,
    quality: Option<u8>,
    width: u32,
    height: u32,
    byte_len: usize,
    data_url: String,
    captured_at: DateTime<Utc>,
}

impl CapturedImage {
    /// Encoded format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Quality the encoder used, `None` for lossless formats.
    pub fn quality(&self) -> Option<u8> {
        self.quality
    }

    /// Photo width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Photo height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of the encoded image before base64.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// `data:<mime>;base64,<payload>` string.
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Wall-clock capture time.
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

/// Encodes `image` at the configured photo size, format and quality.
pub fn encode_surface(image: &RgbImage, settings: &Settings) -> Result<CapturedImage, EncodeError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EncodeError::EmptySurface);
    }

    let target = (settings.photo_width, settings.photo_height);
    if !within_pixel_budget(target.0, target.1) {
        return Err(EncodeError::TooLarge {
            width: target.0,
            height: target.1,
        });
    }
    let resized;
    let photo = if image.dimensions() == target {
        image
    } else {
        resized = imageops::resize(image, target.0, target.1, FilterType::Triangle);
        &resized
    };

    let quality = settings.format.is_lossy().then_some(settings.jpeg_quality);
    let mut bytes = Vec::new();
    match quality {
        Some(quality) => photo.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality))?,
        None => photo.write_with_encoder(PngEncoder::new(&mut bytes))?,
    }

    let data_url = format!(
        "data:{};base64,{}",
        settings.format.mime_type(),
        STANDARD.encode(&bytes)
    );

    tracing::trace!(
        format = %settings.format,
        width = photo.width(),
        height = photo.height(),
        bytes = bytes.len(),
        "encoded capture"
    );

    Ok(CapturedImage {
        format: settings.format,
        quality,
        width: photo.width(),
        height: photo.height(),
        byte_len: bytes.len(),
        data_url,
        captured_at: Utc::now(),
    })
}
