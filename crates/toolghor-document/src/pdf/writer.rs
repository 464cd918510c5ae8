// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — assemble new PDF documents from raster images using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use toolghor_core::error::{Result, ToolghorError};
use tracing::{debug, info, instrument};

/// Images are placed at one pixel per point.
const IMAGE_DPI: f32 = 72.0;

/// Builds new PDF documents from encoded raster images.
pub struct PdfWriter {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new("ToolGhor Images")
    }
}

impl PdfWriter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Create a PDF with one page per image.
    ///
    /// Each page is exactly the size of its image (one pixel per point) and
    /// the image is drawn at the origin, filling the page.
    #[instrument(skip_all, fields(images = images.len()))]
    pub fn images_to_pdf(&self, images: &[Vec<u8>]) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(ToolghorError::Pdf("no images to place".into()));
        }
        info!(title = %self.title, "Creating image PDF");

        let mut doc = PdfDocument::new(&self.title);
        let mut pages: Vec<PdfPage> = Vec::with_capacity(images.len());

        for (index, image_bytes) in images.iter().enumerate() {
            let dynamic_image = ::image::load_from_memory(image_bytes).map_err(|err| {
                ToolghorError::Image(format!("failed to decode image #{}: {err}", index + 1))
            })?;

            let width = dynamic_image.width() as usize;
            let height = dynamic_image.height() as usize;

            // Convert to RGB8 for printpdf.
            let rgb_image = dynamic_image.to_rgb8();
            let raw = RawImage {
                pixels: RawImageData::U8(rgb_image.into_raw()),
                width,
                height,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: Some(1.0),
                    scale_y: Some(1.0),
                    dpi: Some(IMAGE_DPI),
                    rotate: None,
                },
            }];

            pages.push(PdfPage::new(
                points_to_mm(width as f32),
                points_to_mm(height as f32),
                ops,
            ));
            debug!(index, width, height, "Image placed on page");
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "printpdf reported warnings");
        }

        Ok(output)
    }
}

fn points_to_mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}
