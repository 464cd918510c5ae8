// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// toolghor-document — Document engines for the ToolGhor toolbox.
//
// Provides PDF page editing (merge, rotate, delete, reorder, text and page
// image extraction), image-to-PDF assembly, raster format conversion, and
// optional OCR. The `engine` module adapts these synchronous building blocks
// to the async collaborator traits of `toolghor-core`.

pub mod engine;
pub mod image;
pub mod ocr;
pub mod pdf;

// Re-export the primary structs so callers can use `toolghor_document::PdfEditor` etc.
pub use engine::{LocalDocumentEngine, LocalOcrEngine, LocalRasterEngine};
pub use self::image::converter::ImageConverter;
pub use pdf::editor::PdfEditor;
pub use pdf::writer::PdfWriter;
