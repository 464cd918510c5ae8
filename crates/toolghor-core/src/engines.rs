// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator traits — the narrow interfaces the job layer consumes from the
// document, raster, OCR, video and archive engines.
//
// Every method is async so that each collaborator call is a suspension point
// for the calling operation. Implementations live in `toolghor-document` and
// `toolghor-media`; tests substitute in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ArchiveEntry, ImageTarget, VideoJob};

/// PDF document mutation and inspection.
#[async_trait]
pub trait DocumentEngine: Send + Sync {
    /// Number of pages in the document.
    async fn page_count(&self, pdf: Vec<u8>) -> Result<usize>;

    /// Concatenate documents in order into one.
    async fn merge(&self, documents: Vec<Vec<u8>>) -> Result<Vec<u8>>;

    /// Set the absolute rotation of every page.
    async fn rotate_pages(&self, pdf: Vec<u8>, degrees: u16) -> Result<Vec<u8>>;

    /// Remove pages by 0-based index, one at a time, in the order given.
    async fn remove_pages(&self, pdf: Vec<u8>, indices: Vec<usize>) -> Result<Vec<u8>>;

    /// Build a new document from the given 0-based page indices, in order.
    async fn copy_pages(&self, pdf: Vec<u8>, indices: Vec<usize>) -> Result<Vec<u8>>;

    /// One page per image, each page sized to its image.
    async fn images_to_pdf(&self, images: Vec<Vec<u8>>) -> Result<Vec<u8>>;

    /// Text layer of every page, in page order.
    async fn extract_text(&self, pdf: Vec<u8>) -> Result<Vec<String>>;

    /// PNG rendition of every page, in page order.
    async fn render_pages(&self, pdf: Vec<u8>) -> Result<Vec<Vec<u8>>>;
}

/// Raster image re-encoding.
#[async_trait]
pub trait RasterEngine: Send + Sync {
    async fn convert(&self, image: Vec<u8>, target: ImageTarget) -> Result<Vec<u8>>;
}

/// Optical character recognition on raster images.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: Vec<u8>) -> Result<String>;
}

/// Video transcoding and trimming.
#[async_trait]
pub trait VideoEngine: Send + Sync {
    /// Make sure the engine is loaded. Called once per run before any file is
    /// touched; failures surface as `EnvironmentUnavailable`.
    async fn ensure_ready(&self) -> Result<()>;

    /// Run `job` over one input. `input_extension` names the input container.
    async fn process(&self, input: Vec<u8>, input_extension: &str, job: VideoJob)
    -> Result<Vec<u8>>;
}

/// Zip creation and extraction.
#[async_trait]
pub trait ArchiveEngine: Send + Sync {
    async fn create(&self, entries: Vec<ArchiveEntry>) -> Result<Vec<u8>>;

    /// Every file entry of the archive, in archive order. Directory entries
    /// are not returned.
    async fn extract(&self, archive: Vec<u8>) -> Result<Vec<ArchiveEntry>>;
}

/// The full set of collaborators a dispatcher works with.
#[derive(Clone)]
pub struct Engines {
    pub documents: Arc<dyn DocumentEngine>,
    pub raster: Arc<dyn RasterEngine>,
    pub ocr: Arc<dyn OcrEngine>,
    pub video: Arc<dyn VideoEngine>,
    pub archive: Arc<dyn ArchiveEngine>,
}
