// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page editing, image-to-PDF assembly, and page image extraction.

pub mod editor;
pub mod raster;
pub mod writer;

pub use editor::PdfEditor;
pub use writer::PdfWriter;

#[cfg(test)]
pub(crate) mod fixtures;
