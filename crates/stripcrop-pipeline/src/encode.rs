//! Output encoding of the cropped image.

use std::fmt;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::types::CropError;

/// Raster format for the cropped output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless PNG. Used whenever the requested format is unknown.
    #[default]
    Png,
    /// Baseline JPEG. Alpha is dropped.
    Jpeg,
    /// Uncompressed BMP.
    Bmp,
    /// Lossless WebP.
    WebP,
}

impl OutputFormat {
    /// Pick a format from a file extension (with or without the leading
    /// dot, case-insensitive). Unknown extensions give [`Self::Png`].
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "bmp" => Self::Bmp,
            "webp" => Self::WebP,
            _ => Self::Png,
        }
    }

    /// Canonical file extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
            Self::WebP => "webp",
        }
    }

    /// MIME type of the encoded bytes.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Bmp => "image/bmp",
            Self::WebP => "image/webp",
        }
    }

    const fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Bmp => ImageFormat::Bmp,
            Self::WebP => ImageFormat::WebP,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encode an image in the given format.
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
/// WebP keeps alpha only when the source has it.
///
/// # Errors
///
/// Returns [`CropError::ProcessingFailed`] if the encoder rejects the
/// image.
pub fn encode(image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, CropError> {
    let converted;
    let source = match format {
        OutputFormat::Jpeg => {
            converted = DynamicImage::ImageRgb8(image.to_rgb8());
            &converted
        }
        OutputFormat::WebP if image.color().has_alpha() => {
            converted = DynamicImage::ImageRgba8(image.to_rgba8());
            &converted
        }
        OutputFormat::WebP => {
            converted = DynamicImage::ImageRgb8(image.to_rgb8());
            &converted
        }
        OutputFormat::Png | OutputFormat::Bmp => image,
    };

    let mut buf = Cursor::new(Vec::new());
    source
        .write_to(&mut buf, format.image_format())
        .map_err(|e| CropError::ProcessingFailed(format!("{format} encoding failed: {e}")))?;
    Ok(buf.into_inner())
}
