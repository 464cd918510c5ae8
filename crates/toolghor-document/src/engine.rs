// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process engines backing the document, raster and OCR collaborator traits.
//
// lopdf, printpdf, image and ocrs are all synchronous and CPU-bound, so every
// call runs on tokio's blocking pool.

use async_trait::async_trait;
use toolghor_core::engines::{DocumentEngine, OcrEngine, RasterEngine};
use toolghor_core::error::{Result, ToolghorError};
use toolghor_core::ImageTarget;
use tracing::debug;

use crate::image::ImageConverter;
use crate::ocr::OcrConfig;
use crate::pdf::{PdfEditor, PdfWriter};

/// Run a CPU-bound closure on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ToolghorError::Io(std::io::Error::other(err)))?
}

/// PDF operations over lopdf and printpdf.
#[derive(Debug, Default, Clone)]
pub struct LocalDocumentEngine;

#[async_trait]
impl DocumentEngine for LocalDocumentEngine {
    async fn page_count(&self, pdf: Vec<u8>) -> Result<usize> {
        blocking(move || Ok(PdfEditor::from_bytes(&pdf)?.page_count())).await
    }

    async fn merge(&self, documents: Vec<Vec<u8>>) -> Result<Vec<u8>> {
        blocking(move || {
            let editors = documents
                .iter()
                .map(|bytes| PdfEditor::from_bytes(bytes))
                .collect::<Result<Vec<_>>>()?;
            PdfEditor::merge(editors)?.to_bytes()
        })
        .await
    }

    async fn rotate_pages(&self, pdf: Vec<u8>, degrees: u16) -> Result<Vec<u8>> {
        blocking(move || {
            let mut editor = PdfEditor::from_bytes(&pdf)?;
            editor.set_rotation(degrees)?;
            editor.to_bytes()
        })
        .await
    }

    async fn remove_pages(&self, pdf: Vec<u8>, indices: Vec<usize>) -> Result<Vec<u8>> {
        blocking(move || {
            let mut editor = PdfEditor::from_bytes(&pdf)?;
            for index in indices {
                editor.remove_page(index)?;
            }
            editor.to_bytes()
        })
        .await
    }

    async fn copy_pages(&self, pdf: Vec<u8>, indices: Vec<usize>) -> Result<Vec<u8>> {
        blocking(move || PdfEditor::from_bytes(&pdf)?.copy_pages(&indices)?.to_bytes()).await
    }

    async fn images_to_pdf(&self, images: Vec<Vec<u8>>) -> Result<Vec<u8>> {
        blocking(move || PdfWriter::default().images_to_pdf(&images)).await
    }

    async fn extract_text(&self, pdf: Vec<u8>) -> Result<Vec<String>> {
        blocking(move || Ok(PdfEditor::from_bytes(&pdf)?.page_text())).await
    }

    async fn render_pages(&self, pdf: Vec<u8>) -> Result<Vec<Vec<u8>>> {
        blocking(move || {
            PdfEditor::from_bytes(&pdf)?
                .page_images()?
                .into_iter()
                .map(|page| ImageConverter::from_dynamic(page).to_png_bytes())
                .collect()
        })
        .await
    }
}

/// Image re-encoding via the `image` crate.
#[derive(Debug, Clone)]
pub struct LocalRasterEngine {
    jpeg_quality: u8,
}

impl LocalRasterEngine {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }
}

impl Default for LocalRasterEngine {
    fn default() -> Self {
        Self::new(90)
    }
}

#[async_trait]
impl RasterEngine for LocalRasterEngine {
    async fn convert(&self, image: Vec<u8>, target: ImageTarget) -> Result<Vec<u8>> {
        let quality = self.jpeg_quality;
        blocking(move || {
            let converter = ImageConverter::from_bytes(&image)?;
            debug!(
                width = converter.width(),
                height = converter.height(),
                target = target.extension(),
                "Re-encoding image"
            );
            converter.encode(target, quality)
        })
        .await
    }
}

/// OCR backed by `ocrs`. Models are loaded on first use and kept for the
/// lifetime of the engine.
pub struct LocalOcrEngine {
    config: OcrConfig,
    #[cfg(feature = "ocr")]
    recognizer: tokio::sync::OnceCell<std::sync::Arc<crate::ocr::OcrsRecognizer>>,
}

impl LocalOcrEngine {
    pub fn new(config: OcrConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "ocr")]
            recognizer: tokio::sync::OnceCell::new(),
        }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }
}

impl Default for LocalOcrEngine {
    fn default() -> Self {
        Self::new(OcrConfig::default())
    }
}

#[cfg(feature = "ocr")]
#[async_trait]
impl OcrEngine for LocalOcrEngine {
    async fn recognize(&self, image: Vec<u8>) -> Result<String> {
        use std::sync::Arc;

        use crate::ocr::OcrsRecognizer;

        let recognizer = self
            .recognizer
            .get_or_try_init(|| {
                let config = self.config.clone();
                async move { blocking(move || OcrsRecognizer::new(&config).map(Arc::new)).await }
            })
            .await?
            .clone();

        blocking(move || {
            let decoded = ::image::load_from_memory(&image)
                .map_err(|err| ToolghorError::Image(format!("failed to decode image: {err}")))?;
            recognizer.recognize_text(&decoded)
        })
        .await
    }
}

#[cfg(not(feature = "ocr"))]
#[async_trait]
impl OcrEngine for LocalOcrEngine {
    async fn recognize(&self, _image: Vec<u8>) -> Result<String> {
        Err(ToolghorError::unavailable(
            "OCR engine",
            "this build does not include the `ocr` feature",
        ))
    }
}
