// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures for dispatcher integration tests.
//
// Document, raster and archive work goes through the real local engines.
// OCR and video are faked: they need models and an ffmpeg binary.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use lopdf::{Document, Object};
use toolghor_core::engines::{DocumentEngine, OcrEngine, VideoEngine};
use toolghor_core::{Engines, QueuedFile, Result, ToolghorError, VideoJob};
use toolghor_document::{LocalDocumentEngine, LocalRasterEngine};
use toolghor_jobs::{Dispatcher, MemorySink, ProgressReporter, QueueStore, ScriptedPrompt};
use toolghor_media::ZipArchiver;

/// Recognised text is derived from the image size.
pub struct FakeOcr;

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn recognize(&self, image: Vec<u8>) -> Result<String> {
        let img = image::load_from_memory(&image)
            .map_err(|err| ToolghorError::Ocr(err.to_string()))?;
        Ok(format!("{}x{}", img.width(), img.height()))
    }
}

/// Echoes its input tagged with the job, after a short delay. Every call is
/// logged as `start <tag>` / `end <tag>`.
pub struct FakeVideo {
    pub ready: bool,
    pub delay: Duration,
    pub events: Mutex<Vec<String>>,
}

impl FakeVideo {
    pub fn new(ready: bool) -> Self {
        Self {
            ready,
            delay: Duration::from_millis(0),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoEngine for FakeVideo {
    async fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(ToolghorError::unavailable("ffmpeg", "not installed"))
        }
    }

    async fn process(&self, input: Vec<u8>, input_extension: &str, job: VideoJob) -> Result<Vec<u8>> {
        let tag = String::from_utf8_lossy(&input).into_owned();
        self.events.lock().unwrap().push(format!("start {tag}"));
        tokio::time::sleep(self.delay).await;
        self.events.lock().unwrap().push(format!("end {tag}"));

        let label = match job {
            VideoJob::Convert { target } => format!("{input_extension}->{}", target.extension()),
            VideoJob::Trim {
                start_seconds,
                duration_seconds,
            } => format!("{input_extension}[{start_seconds}+{duration_seconds}]"),
        };
        Ok(format!("{tag}|{label}").into_bytes())
    }
}

pub struct Harness {
    pub queue: Arc<QueueStore>,
    pub dispatcher: Dispatcher,
    pub sink: Arc<MemorySink>,
    pub video: Arc<FakeVideo>,
}

impl Harness {
    pub fn new(answers: &[&str]) -> Self {
        Self::build(answers, FakeVideo::new(true), false)
    }

    pub fn build(answers: &[&str], video: FakeVideo, exclusive: bool) -> Self {
        let queue = Arc::new(QueueStore::new(Arc::new(ProgressReporter::new())));
        let sink = Arc::new(MemorySink::new());
        let video = Arc::new(video);
        let engines = Engines {
            documents: Arc::new(LocalDocumentEngine),
            raster: Arc::new(LocalRasterEngine::default()),
            ocr: Arc::new(FakeOcr),
            video: video.clone(),
            archive: Arc::new(ZipArchiver::default()),
        };
        let dispatcher = Dispatcher::new(
            Arc::clone(&queue),
            engines,
            Arc::new(ScriptedPrompt::new(answers.iter().copied())),
            sink.clone(),
        )
        .with_exclusive_runs(exclusive);

        Self {
            queue,
            dispatcher,
            sink,
            video,
        }
    }

    pub fn enqueue(&self, files: Vec<QueuedFile>) {
        self.queue.push_all(files);
    }

    pub fn status(&self) -> (u8, String) {
        let state = self.queue.reporter().current();
        (state.percent, state.message)
    }

    pub fn artifact(&self, name: &str) -> Vec<u8> {
        self.sink
            .artifacts()
            .into_iter()
            .find(|a| a.name == name)
            .unwrap_or_else(|| panic!("no artifact named {name}: {:?}", self.sink.names()))
            .data
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
    out
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 200, 30]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg).unwrap();
    out
}

/// A PDF whose page `n` (1-based) is `n * 10` points wide.
pub async fn numbered_pdf(pages: u32) -> Vec<u8> {
    let images = (1..=pages).map(|n| png(n * 10, 8)).collect();
    LocalDocumentEngine.images_to_pdf(images).await.unwrap()
}

/// Page widths in points, in page order.
pub fn page_widths(pdf: &[u8]) -> Vec<u32> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let mut node = doc.get_dictionary(page_id).unwrap();
            loop {
                if let Ok(Object::Array(mediabox)) = node.get(b"MediaBox") {
                    return mediabox[2].as_float().unwrap().round() as u32;
                }
                let parent = node.get(b"Parent").and_then(Object::as_reference).unwrap();
                node = doc.get_dictionary(parent).unwrap();
            }
        })
        .collect()
}

pub fn pdf_file(name: &str, data: Vec<u8>) -> QueuedFile {
    QueuedFile::from_bytes(name, "application/pdf", data)
}
