//! Inbound widget options and their normalized form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const DEFAULT_WIDTH: u32 = 320;
const DEFAULT_HEIGHT: u32 = 240;
const DEFAULT_JPEG_QUALITY: u8 = 90;
const MAX_JPEG_QUALITY: i64 = 100;
const DEFAULT_RENDER_TIMEOUT_MS: u64 = 50;

/// Largest accepted width or height, in pixels.
pub const MAX_DIMENSION: u32 = 8192;

/// Largest surface or photo, in pixels, that will be allocated.
pub const MAX_PIXELS: u64 = 4096 * 4096;

/// Whether a `width` x `height` RGB buffer fits within [`MAX_PIXELS`].
pub fn within_pixel_budget(width: u32, height: u32) -> bool {
    u64::from(width) * u64::from(height) <= MAX_PIXELS
}

/// Image format of captured photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG, the canonical format.
    #[default]
    Jpeg,
    /// Lossless PNG.
    Png,
    /// Alias spelling of JPEG.
    Jpg,
}

impl ImageFormat {
    /// Parses a configured format name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "jpg" => Some(Self::Jpg),
            _ => None,
        }
    }

    /// Mime type used in the encoded data URL.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg | Self::Jpg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Whether the configured quality applies to this format.
    pub fn is_lossy(self) -> bool {
        !matches!(self, Self::Png)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Jpg => "jpg",
        };
        f.write_str(name)
    }
}

/// Raw widget options as supplied by the page or a config file.
///
/// Every field is optional; [`PhotoCamConfig::normalize`] fills in
/// defaults and clamps out-of-range values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhotoCamConfig {
    /// Request camera access as soon as the widget initializes.
    pub auto_start: Option<bool>,
    /// Image format name (`jpeg`, `png` or `jpg`).
    pub format: Option<String>,
    /// Viewport width in pixels.
    pub width: Option<u32>,
    /// Viewport height in pixels.
    pub height: Option<u32>,
    /// Captured photo width in pixels.
    pub photo_width: Option<u32>,
    /// Captured photo height in pixels.
    pub photo_height: Option<u32>,
    /// Encoding quality between 1 and 100.
    pub jpeg_quality: Option<i64>,
    /// Render loop period in milliseconds.
    pub render_timeout: Option<i64>,
    /// Identifiers of components to process on capture.
    pub process: Option<String>,
    /// Identifiers of components to update on capture.
    pub update: Option<String>,
    /// Facing-mode keyword (`user`, `environment`) or a device identifier.
    pub device: Option<String>,
    /// Skip initialization entirely.
    pub disabled: Option<bool>,
}

/// Normalized, immutable widget settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Captured photo width in pixels.
    pub photo_width: u32,
    /// Captured photo height in pixels.
    pub photo_height: u32,
    /// Encoded image format.
    pub format: ImageFormat,
    /// Encoding quality in `1..=100`.
    pub jpeg_quality: u8,
    /// Render loop period, at least one millisecond.
    pub render_timeout: Duration,
    /// Whether the session starts during initialization.
    pub auto_start: bool,
    /// Device selector, if any.
    pub device: Option<String>,
    /// Extra components to process on capture.
    pub process: Option<String>,
    /// Components to update on capture.
    pub update: Option<String>,
    /// Whether the widget is disabled.
    pub disabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        PhotoCamConfig::default().normalize()
    }
}

impl PhotoCamConfig {
    /// Resolves defaults and clamps values into their valid ranges.
    pub fn normalize(&self) -> Settings {
        let width = dimension("width", self.width, DEFAULT_WIDTH);
        let height = dimension("height", self.height, DEFAULT_HEIGHT);

        let jpeg_quality = match self.jpeg_quality {
            Some(q) if q >= 1 => q.min(MAX_JPEG_QUALITY) as u8,
            _ => DEFAULT_JPEG_QUALITY,
        };

        let render_timeout = match self.render_timeout {
            Some(ms) if ms >= 1 => Duration::from_millis(ms as u64),
            _ => Duration::from_millis(DEFAULT_RENDER_TIMEOUT_MS),
        };

        let format = self
            .format
            .as_deref()
            .and_then(ImageFormat::parse)
            .unwrap_or_default();

        let settings = Settings {
            width,
            height,
            photo_width: dimension("photoWidth", self.photo_width, width),
            photo_height: dimension("photoHeight", self.photo_height, height),
            format,
            jpeg_quality,
            render_timeout,
            auto_start: self.auto_start.unwrap_or(true),
            device: trimmed(self.device.as_deref()),
            process: trimmed(self.process.as_deref()),
            update: trimmed(self.update.as_deref()),
            disabled: self.disabled.unwrap_or(false),
        };

        tracing::debug!(
            format = %settings.format,
            jpeg_quality = settings.jpeg_quality,
            render_timeout_ms = settings.render_timeout.as_millis() as u64,
            "normalized widget options"
        );

        settings
    }
}

fn dimension(name: &str, value: Option<u32>, fallback: u32) -> u32 {
    match value {
        Some(v) if v > MAX_DIMENSION => {
            tracing::warn!(option = name, value = v, max = MAX_DIMENSION, "dimension clamped");
            MAX_DIMENSION
        }
        Some(v) if v > 0 => v,
        _ => fallback,
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
