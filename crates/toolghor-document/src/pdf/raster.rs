// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page image extraction — recover the raster content of each page from its
// image XObjects.
//
// Scanned documents carry one full-page image per page; the largest image
// XObject on a page is taken as that page's rendition. Vector-only pages have
// no raster content and are reported as errors rather than rendered blank.

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use toolghor_core::error::{Result, ToolghorError};
use tracing::{debug, instrument};

use super::editor::PdfEditor;

impl PdfEditor {
    /// The largest embedded image of every page, in page order.
    #[instrument(skip(self), fields(pages = self.page_count()))]
    pub fn page_images(&self) -> Result<Vec<DynamicImage>> {
        let doc = self.document();
        doc.get_pages()
            .into_iter()
            .map(|(page_number, page_id)| {
                largest_page_image(doc, page_id)?.ok_or_else(|| {
                    ToolghorError::Pdf(format!(
                        "page {page_number} has no embedded image to extract"
                    ))
                })
            })
            .collect()
    }
}

/// Decode every image XObject on the page and keep the one with most pixels.
fn largest_page_image(doc: &Document, page_id: ObjectId) -> Result<Option<DynamicImage>> {
    let Some(resources) = page_resources(doc, page_id) else {
        return Ok(None);
    };
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
    else {
        return Ok(None);
    };

    let mut best: Option<DynamicImage> = None;
    for (name, value) in xobjects.iter() {
        let Some(Object::Stream(stream)) = resolve(doc, value) else {
            continue;
        };
        if !is_name(stream.dict.get(b"Subtype").ok(), b"Image") {
            continue;
        }
        let image = decode_image(stream)?;
        debug!(
            name = %String::from_utf8_lossy(name),
            width = image.width(),
            height = image.height(),
            "Found page image"
        );
        let pixels = |img: &DynamicImage| u64::from(img.width()) * u64::from(img.height());
        if best.as_ref().is_none_or(|current| pixels(&image) > pixels(current)) {
            best = Some(image);
        }
    }
    Ok(best)
}

/// The page's `/Resources`, following inheritance up the page tree.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node_id = page_id;
    for _ in 0..64 {
        let node = doc.get_dictionary(node_id).ok()?;
        if let Some(resources) = node
            .get(b"Resources")
            .ok()
            .and_then(|obj| resolve(doc, obj))
            .and_then(|obj| obj.as_dict().ok())
        {
            return Some(resources);
        }
        node_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn is_name(object: Option<&Object>, expected: &[u8]) -> bool {
    matches!(object, Some(Object::Name(name)) if name.as_slice() == expected)
}

/// Last filter applied to a stream, i.e. the encoding of its decoded bytes.
fn final_filter(dict: &Dictionary) -> Option<Vec<u8>> {
    match dict.get(b"Filter").ok()? {
        Object::Name(name) => Some(name.clone()),
        Object::Array(filters) => match filters.last()? {
            Object::Name(name) => Some(name.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn decode_image(stream: &Stream) -> Result<DynamicImage> {
    let filter = final_filter(&stream.dict);
    match filter.as_deref() {
        Some(b"DCTDecode") => image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
            .map_err(|err| ToolghorError::Pdf(format!("embedded JPEG is corrupt: {err}"))),
        Some(unsupported @ (b"JPXDecode" | b"JBIG2Decode" | b"CCITTFaxDecode")) => Err(
            ToolghorError::Pdf(format!(
                "unsupported image encoding {}",
                String::from_utf8_lossy(unsupported)
            )),
        ),
        Some(_) => {
            let data = stream.decompressed_content().map_err(|err| {
                ToolghorError::Pdf(format!("cannot decompress image stream: {err}"))
            })?;
            decode_raw(&stream.dict, data)
        }
        None => decode_raw(&stream.dict, stream.content.clone()),
    }
}

/// Interpret raw 8-bit samples using the stream's Width/Height.
fn decode_raw(dict: &Dictionary, data: Vec<u8>) -> Result<DynamicImage> {
    let dimension = |key: &[u8]| -> Result<u32> {
        dict.get(key)
            .and_then(Object::as_i64)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                ToolghorError::Pdf(format!(
                    "image stream lacks a valid /{}",
                    String::from_utf8_lossy(key)
                ))
            })
    };
    let width = dimension(b"Width")?;
    let height = dimension(b"Height")?;

    let bits = dict
        .get(b"BitsPerComponent")
        .and_then(Object::as_i64)
        .unwrap_or(8);
    if bits != 8 {
        return Err(ToolghorError::Pdf(format!(
            "unsupported image depth of {bits} bits per component"
        )));
    }

    let pixel_count = width as usize * height as usize;
    let available = data.len();
    let channels = available / pixel_count;
    let samples = pixel_count * channels;
    let mut data = data;
    data.truncate(samples);

    let image = match channels {
        1 => GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
        4 => RgbImage::from_raw(width, height, cmyk_to_rgb(&data)).map(DynamicImage::ImageRgb8),
        _ => None,
    };
    image.ok_or_else(|| {
        ToolghorError::Pdf(format!(
            "image stream has {available} bytes, not enough for {width}x{height}"
        ))
    })
}

fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    cmyk.chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - u16::from(px[3]);
            let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2])]
        })
        .collect()
}
