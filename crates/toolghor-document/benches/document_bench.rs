// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the toolghor-document crate: assembling a PDF from
// images and re-encoding an image into each target format.

use std::io::Cursor;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{ImageFormat, Rgb, RgbImage};

use toolghor_core::ImageTarget;
use toolghor_document::{ImageConverter, PdfWriter};

fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("encode bench fixture");
    out
}

/// Four 200x150 images into a four page PDF.
fn bench_images_to_pdf(c: &mut Criterion) {
    let images: Vec<Vec<u8>> = (0..4).map(|_| gradient_png(200, 150)).collect();
    let writer = PdfWriter::default();

    c.bench_function("images_to_pdf (4 x 200x150)", |b| {
        b.iter(|| black_box(writer.images_to_pdf(black_box(&images)).expect("pdf")));
    });
}

fn bench_convert(c: &mut Criterion) {
    let png = gradient_png(256, 256);
    let mut group = c.benchmark_group("convert (256x256)");
    for target in [ImageTarget::Png, ImageTarget::Jpg, ImageTarget::Webp] {
        group.bench_function(target.extension(), |b| {
            b.iter(|| {
                let converter = ImageConverter::from_bytes(black_box(&png)).expect("decode");
                black_box(converter.encode(target, 90).expect("encode"));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_images_to_pdf, bench_convert);
criterion_main!(benches);
