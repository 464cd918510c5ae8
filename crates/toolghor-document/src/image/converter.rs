// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image converter — decode an encoded raster image and re-encode it as PNG,
// JPEG or WebP using the `image` crate.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use toolghor_core::ImageTarget;
use toolghor_core::error::{Result, ToolghorError};
use tracing::{debug, instrument};

/// A single decoded image ready to be written in another format.
///
/// ```ignore
/// let webp = ImageConverter::from_bytes(&png_bytes)?.encode(ImageTarget::Webp, 90)?;
/// ```
pub struct ImageConverter {
    /// The decoded image.
    image: DynamicImage,
}

impl ImageConverter {
    /// Decode raw encoded bytes (JPEG, PNG, WebP, GIF, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| ToolghorError::Image(format!("failed to decode image: {err}")))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode into `target`. `jpeg_quality` (1-100) only affects JPEG.
    pub fn encode(&self, target: ImageTarget, jpeg_quality: u8) -> Result<Vec<u8>> {
        match target {
            ImageTarget::Png => self.to_png_bytes(),
            ImageTarget::Jpg => self.to_jpeg_bytes(jpeg_quality),
            ImageTarget::Webp => self.to_webp_bytes(),
        }
    }

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Encode as JPEG with the given quality. Alpha is flattened away.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(|err| ToolghorError::Image(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// Encode as lossless WebP.
    pub fn to_webp_bytes(&self) -> Result<Vec<u8>> {
        // The WebP encoder only accepts 8-bit RGB(A).
        let rgba = DynamicImage::ImageRgba8(self.image.to_rgba8());
        encode_to_format(&rgba, ImageFormat::WebP)
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| ToolghorError::Image(format!("image encoding failed: {err}")))?;
    Ok(buffer)
}
