// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operation dispatcher — the uniform run wrapper.
//
// Every invocation goes Idle -> Validating -> (Rejected | ParameterAcquisition)
// -> (Rejected | Processing) -> (Completed | Failed) and always leaves a
// non-empty status behind. Each run works on its own queue snapshot; the only
// state runs share is the progress signal, where the last write wins.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use toolghor_core::error::{Result, ToolghorError};
use toolghor_core::{
    Artifact, ArchiveEntry, Engines, ErrorClass, ImageTarget, QueuedFile, RunId, VideoJob,
    VideoTarget, mime_from_extension,
};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::operations::{
    ANGLE_PARAM, END_TIME_PARAM, IMAGE_FORMAT_PARAM, OperationDescriptor, OperationId,
    PAGE_LIST_PARAM, PAGE_ORDER_PARAM, ParameterSpec, START_TIME_PARAM, VIDEO_FORMAT_PARAM,
    is_image,
};
use crate::params;
use crate::progress::ProgressReporter;
use crate::prompt::{ParameterPrompt, PromptRequest, PromptResponse};
use crate::queue::QueueStore;
use crate::runner::{ProcessingLoop, Unit};
use crate::sink::ArtifactSink;

const PDF_MIME: &str = "application/pdf";
const ZIP_MIME: &str = "application/zip";
const TEXT_MIME: &str = "text/plain";

/// How one invocation ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Nothing matched, or a parameter was cancelled or invalid. No file was
    /// touched.
    Rejected(String),
    /// Every selected file was handled.
    Completed {
        /// Names of the delivered artifacts, in delivery order.
        artifacts: Vec<String>,
        /// Names of input files that were skipped.
        skipped: Vec<String>,
    },
    /// A collaborator failed; the remaining files were not processed.
    Failed(ToolghorError),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Completed, but every selected file was skipped and nothing delivered.
    pub fn skipped_everything(&self) -> bool {
        matches!(self, Self::Completed { artifacts, skipped } if artifacts.is_empty() && !skipped.is_empty())
    }
}

/// Resolved answers to an operation's prompts.
#[derive(Debug, Clone, PartialEq)]
enum Params {
    None,
    Angle(u16),
    PageList(String),
    PageOrder(String),
    Image(ImageTarget),
    Video(VideoTarget),
    Window { start: f64, duration: f64 },
}

struct Completion {
    artifacts: Vec<String>,
    skipped: Vec<String>,
}

/// Runs operations over the queue.
pub struct Dispatcher {
    queue: Arc<QueueStore>,
    reporter: Arc<ProgressReporter>,
    engines: Engines,
    prompt: Arc<dyn ParameterPrompt>,
    sink: Arc<dyn ArtifactSink>,
    /// Present when runs must not overlap.
    exclusive: Option<tokio::sync::Mutex<()>>,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<QueueStore>,
        engines: Engines,
        prompt: Arc<dyn ParameterPrompt>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            reporter: Arc::clone(queue.reporter()),
            queue,
            engines,
            prompt,
            sink,
            exclusive: None,
        }
    }

    /// Make each run wait for the previous one to finish.
    pub fn with_exclusive_runs(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive.then(|| tokio::sync::Mutex::new(()));
        self
    }

    /// Every operation this dispatcher can run.
    pub fn operations() -> impl Iterator<Item = &'static OperationDescriptor> {
        OperationId::ALL.into_iter().map(|id| id.descriptor())
    }

    pub fn queue(&self) -> &Arc<QueueStore> {
        &self.queue
    }

    pub fn reporter(&self) -> &Arc<ProgressReporter> {
        &self.reporter
    }

    /// Validate, prompt, and process one operation.
    pub async fn run(&self, id: OperationId) -> RunOutcome {
        let run_id = RunId::new();
        let span = info_span!("run", %run_id, operation = %id);
        self.run_in_span(id.descriptor()).instrument(span).await
    }

    async fn run_in_span(&self, descriptor: &'static OperationDescriptor) -> RunOutcome {
        let _serialised = match &self.exclusive {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let selected: Vec<QueuedFile> = self
            .queue
            .snapshot()
            .into_iter()
            .filter(|file| descriptor.selection.matches(file))
            .collect();
        if selected.is_empty() {
            return self.reject(descriptor.empty_message.to_string());
        }
        info!(selected = selected.len(), "Run started");

        let params = match self.acquire(descriptor.id).await {
            Ok(params) => params,
            Err(err) if err.class() == ErrorClass::Validation => {
                return self.reject(err.status_text());
            }
            Err(err) => return self.fail(err),
        };

        self.reporter
            .set(descriptor.progress.start, descriptor.start_message);

        match self.process(descriptor, &selected, params).await {
            Ok(Completion { artifacts, skipped }) => {
                if artifacts.is_empty() && !skipped.is_empty() {
                    // Nothing was produced: the last skip status stays shown.
                    warn!(skipped = skipped.len(), "Every selected file was skipped");
                    self.reporter.set_percent(100);
                } else {
                    self.reporter.set(100, descriptor.completion_message);
                }
                info!(
                    artifacts = artifacts.len(),
                    skipped = skipped.len(),
                    "Run completed"
                );
                RunOutcome::Completed { artifacts, skipped }
            }
            Err(err) => self.fail(err),
        }
    }

    fn reject(&self, message: String) -> RunOutcome {
        info!(%message, "Run rejected");
        self.reporter.set_status(message.clone());
        RunOutcome::Rejected(message)
    }

    fn fail(&self, err: ToolghorError) -> RunOutcome {
        error!(error = %err, class = ?err.class(), "Run failed");
        self.reporter.set_status(err.status_text());
        RunOutcome::Failed(err)
    }

    // -- Parameter acquisition --

    async fn acquire(&self, id: OperationId) -> Result<Params> {
        Ok(match id {
            OperationId::RotatePdf => {
                let answer = self.ask(&ANGLE_PARAM).await?;
                Params::Angle(params::parse_angle(&answer).ok_or_else(|| invalid(&ANGLE_PARAM))?)
            }
            OperationId::DeletePages => Params::PageList(self.ask(&PAGE_LIST_PARAM).await?),
            OperationId::ReorderPages => Params::PageOrder(self.ask(&PAGE_ORDER_PARAM).await?),
            OperationId::ConvertImage => {
                let answer = self.ask(&IMAGE_FORMAT_PARAM).await?;
                Params::Image(
                    ImageTarget::from_keyword(answer.trim())
                        .ok_or_else(|| invalid(&IMAGE_FORMAT_PARAM))?,
                )
            }
            OperationId::ConvertVideo => {
                let answer = self.ask(&VIDEO_FORMAT_PARAM).await?;
                Params::Video(
                    VideoTarget::from_keyword(answer.trim())
                        .ok_or_else(|| invalid(&VIDEO_FORMAT_PARAM))?,
                )
            }
            OperationId::TrimVideo => {
                let start = self.ask(&START_TIME_PARAM).await?;
                let end = self.ask(&END_TIME_PARAM).await?;
                let (start, duration) = params::trim_window(&start, &end)?;
                Params::Window { start, duration }
            }
            OperationId::MergePdfs
            | OperationId::ImagesToPdf
            | OperationId::PdfToImages
            | OperationId::ExtractText
            | OperationId::CreateZip
            | OperationId::ExtractZip => Params::None,
        })
    }

    /// Ask one question. A cancelled or blank answer is a validation error.
    async fn ask(&self, spec: &ParameterSpec) -> Result<String> {
        match self.prompt.ask(&PromptRequest::from(spec)).await? {
            PromptResponse::Provided(answer) if !answer.trim().is_empty() => {
                debug!(label = spec.label, %answer, "Parameter provided");
                Ok(answer)
            }
            _ => Err(invalid(spec)),
        }
    }

    // -- Processing --

    async fn process(
        &self,
        descriptor: &OperationDescriptor,
        files: &[QueuedFile],
        params: Params,
    ) -> Result<Completion> {
        let lp = ProcessingLoop::new(&self.reporter, descriptor.progress);
        match (descriptor.id, params) {
            (OperationId::MergePdfs, _) => self.merge_pdfs(&lp, files).await,
            (OperationId::ImagesToPdf, _) => self.images_to_pdf(&lp, files).await,
            (OperationId::PdfToImages, _) => self.pdf_to_images(&lp, files).await,
            (OperationId::RotatePdf, Params::Angle(angle)) => {
                self.rotate(&lp, files, angle).await
            }
            (OperationId::DeletePages, Params::PageList(list)) => {
                self.delete_pages(&lp, files, &list).await
            }
            (OperationId::ReorderPages, Params::PageOrder(order)) => {
                self.reorder_pages(&lp, files, &order).await
            }
            (OperationId::ConvertImage, Params::Image(target)) => {
                self.convert_images(&lp, files, target).await
            }
            (OperationId::ExtractText, _) => self.extract_text(&lp, files).await,
            (OperationId::ConvertVideo, Params::Video(target)) => {
                self.video(&lp, files, VideoJob::Convert { target }).await
            }
            (OperationId::TrimVideo, Params::Window { start, duration }) => {
                let job = VideoJob::Trim {
                    start_seconds: start,
                    duration_seconds: duration,
                };
                self.video(&lp, files, job).await
            }
            (OperationId::CreateZip, _) => self.create_zip(&lp, files).await,
            (OperationId::ExtractZip, _) => self.extract_zip(&lp, files).await,
            (id, params) => Err(ToolghorError::Interaction(format!(
                "{id} cannot run with {params:?}"
            ))),
        }
    }

    async fn deliver(&self, artifact: Artifact) -> Result<String> {
        let name = artifact.name.clone();
        self.sink.deliver(artifact).await?;
        debug!(%name, "Artifact delivered");
        Ok(name)
    }

    async fn deliver_aggregate(&self, artifact: Artifact, skipped: Vec<String>) -> Result<Completion> {
        let name = self.deliver(artifact).await?;
        Ok(Completion {
            artifacts: vec![name],
            skipped,
        })
    }

    async fn merge_pdfs(&self, lp: &ProcessingLoop<'_>, files: &[QueuedFile]) -> Result<Completion> {
        let docs = &self.engines.documents;
        let loaded = lp
            .run(files, |file| async move {
                let bytes = file.read().await?;
                let pages = docs.page_count(bytes.clone()).await?;
                debug!(name = %file.name, pages, "PDF loaded");
                Ok(Unit::Produced(bytes))
            })
            .await?;

        let merged = docs.merge(loaded.outputs).await?;
        self.deliver_aggregate(Artifact::new("merged.pdf", PDF_MIME, merged), loaded.skipped)
            .await
    }

    async fn images_to_pdf(&self, lp: &ProcessingLoop<'_>, files: &[QueuedFile]) -> Result<Completion> {
        let images = lp
            .run(files, |file| async move { Ok(Unit::Produced(file.read().await?)) })
            .await?;

        let pdf = self.engines.documents.images_to_pdf(images.outputs).await?;
        self.deliver_aggregate(Artifact::new("images.pdf", PDF_MIME, pdf), images.skipped)
            .await
    }

    /// One zip for all PDFs: flat `<stem>_page_<n>.png` files for a single
    /// PDF, a `<stem>/` folder per PDF otherwise.
    async fn pdf_to_images(&self, lp: &ProcessingLoop<'_>, files: &[QueuedFile]) -> Result<Completion> {
        let docs = &self.engines.documents;
        let nested = files.len() > 1;
        let mut folders = HashSet::new();

        let rendered = lp
            .run(files, |file| {
                let prefix = if nested {
                    format!("{}/", unique_folder(&mut folders, file.stem()))
                } else {
                    format!("{}_", file.stem())
                };
                async move {
                    let pages = docs.render_pages(file.read().await?).await?;
                    debug!(name = %file.name, pages = pages.len(), "Pages rendered");
                    let entries: Vec<ArchiveEntry> = pages
                        .into_iter()
                        .enumerate()
                        .map(|(index, data)| ArchiveEntry {
                            name: format!("{prefix}page_{}.png", index + 1),
                            data,
                        })
                        .collect();
                    Ok(Unit::Produced(entries))
                }
            })
            .await?;

        let entries = rendered.outputs.into_iter().flatten().collect();
        let zip = self.engines.archive.create(entries).await?;
        self.deliver_aggregate(Artifact::new("pdf_images.zip", ZIP_MIME, zip), rendered.skipped)
            .await
    }

    async fn rotate(&self, lp: &ProcessingLoop<'_>, files: &[QueuedFile], angle: u16) -> Result<Completion> {
        let docs = &self.engines.documents;
        let done = lp
            .run(files, |file| async move {
                let rotated = docs.rotate_pages(file.read().await?, angle).await?;
                let name = format!("rotated_{}", file.name);
                Ok(Unit::Produced(self.deliver(Artifact::new(name, PDF_MIME, rotated)).await?))
            })
            .await?;
        Ok(per_file(done))
    }

    async fn delete_pages(&self, lp: &ProcessingLoop<'_>, files: &[QueuedFile], list: &str) -> Result<Completion> {
        let docs = &self.engines.documents;
        let done = lp
            .run(files, |file| async move {
                let bytes = file.read().await?;
                let total = docs.page_count(bytes.clone()).await?;
                let indices = params::parse_delete_pages(list, total);
                debug!(name = %file.name, total, removing = indices.len(), "Deleting pages");
                let edited = docs.remove_pages(bytes, indices).await?;
                let name = format!("edited_{}", file.name);
                Ok(Unit::Produced(self.deliver(Artifact::new(name, PDF_MIME, edited)).await?))
            })
            .await?;
        Ok(per_file(done))
    }

    async fn reorder_pages(&self, lp: &ProcessingLoop<'_>, files: &[QueuedFile], order: &str) -> Result<Completion> {
        let docs = &self.engines.documents;
        let done = lp
            .run(files, |file| async move {
                let bytes = file.read().await?;
                let total = docs.page_count(bytes.clone()).await?;
                let Some(indices) = params::parse_page_order(order, total) else {
                    return Ok(Unit::Skipped(PAGE_ORDER_PARAM.invalid_message.to_string()));
                };
                let reordered = docs.copy_pages(bytes, indices).await?;
                let name = format!("reordered_{}", file.name);
                Ok(Unit::Produced(self.deliver(Artifact::new(name, PDF_MIME, reordered)).await?))
            })
            .await?;
        Ok(per_file(done))
    }

    async fn convert_images(
        &self,
        lp: &ProcessingLoop<'_>,
        files: &[QueuedFile],
        target: ImageTarget,
    ) -> Result<Completion> {
        let raster = &self.engines.raster;
        let done = lp
            .run(files, |file| async move {
                let converted = raster.convert(file.read().await?, target).await?;
                let name = format!("{}.{}", file.stem(), target.extension());
                let artifact = Artifact::new(name, target.mime_type(), converted);
                Ok(Unit::Produced(self.deliver(artifact).await?))
            })
            .await?;
        Ok(per_file(done))
    }

    /// OCR for images, the text layer for PDFs, all in one text file.
    async fn extract_text(&self, lp: &ProcessingLoop<'_>, files: &[QueuedFile]) -> Result<Completion> {
        let (docs, ocr) = (&self.engines.documents, &self.engines.ocr);
        let blocks = lp
            .run(files, |file| async move {
                let bytes = file.read().await?;
                let block = if is_image(&file.mime_type) {
                    let text = ocr.recognize(bytes).await?;
                    format!("--- {} ---\n{}\n\n", file.name, text)
                } else {
                    docs.extract_text(bytes)
                        .await?
                        .iter()
                        .enumerate()
                        .map(|(index, text)| {
                            format!("--- {} Page {} ---\n{}\n\n", file.name, index + 1, text)
                        })
                        .collect()
                };
                Ok(Unit::Produced(block))
            })
            .await?;

        let text: String = blocks.outputs.concat();
        let artifact = Artifact::new("extracted_text.txt", TEXT_MIME, text.into_bytes());
        self.deliver_aggregate(artifact, blocks.skipped).await
    }

    async fn video(&self, lp: &ProcessingLoop<'_>, files: &[QueuedFile], job: VideoJob) -> Result<Completion> {
        let video = &self.engines.video;
        video.ensure_ready().await?;

        let reporter = &self.reporter;
        let done = lp
            .run(files, |file| async move {
                let (verb, name, mime_type) = match job {
                    VideoJob::Convert { target } => (
                        "Converting",
                        format!("{}.{}", file.stem(), target.extension()),
                        target.mime_type().to_string(),
                    ),
                    VideoJob::Trim { .. } => (
                        "Trimming",
                        format!("trimmed_{}", file.name),
                        file.mime_type.clone(),
                    ),
                };
                reporter.set_status(format!("{verb} {}...", file.name));

                let extension = file.extension().unwrap_or_default();
                let output = video.process(file.read().await?, extension, job).await?;
                Ok(Unit::Produced(self.deliver(Artifact::new(name, mime_type, output)).await?))
            })
            .await?;
        Ok(per_file(done))
    }

    async fn create_zip(&self, lp: &ProcessingLoop<'_>, files: &[QueuedFile]) -> Result<Completion> {
        let entries = lp
            .run(files, |file| async move {
                Ok(Unit::Produced(ArchiveEntry {
                    name: file.name.clone(),
                    data: file.read().await?,
                }))
            })
            .await?;

        let zip = self.engines.archive.create(entries.outputs).await?;
        self.deliver_aggregate(Artifact::new("archive.zip", ZIP_MIME, zip), entries.skipped)
            .await
    }

    /// Every file entry of every archive, under its archive path. An entry
    /// that cannot be read fails the whole run.
    async fn extract_zip(&self, lp: &ProcessingLoop<'_>, files: &[QueuedFile]) -> Result<Completion> {
        let archive = &self.engines.archive;
        let done = lp
            .run(files, |file| async move {
                let entries = archive.extract(file.read().await?).await?;
                debug!(name = %file.name, entries = entries.len(), "Archive opened");
                let mut delivered = Vec::with_capacity(entries.len());
                for entry in entries {
                    let mime_type = Path::new(&entry.name)
                        .extension()
                        .map(|ext| mime_from_extension(&ext.to_string_lossy().to_lowercase()))
                        .unwrap_or_default();
                    delivered.push(self.deliver(Artifact::new(entry.name, mime_type, entry.data)).await?);
                }
                Ok(Unit::Produced(delivered))
            })
            .await?;

        Ok(Completion {
            artifacts: done.outputs.into_iter().flatten().collect(),
            skipped: done.skipped,
        })
    }
}

fn invalid(spec: &ParameterSpec) -> ToolghorError {
    ToolghorError::validation(spec.invalid_message)
}

fn per_file(done: crate::runner::Processed<String>) -> Completion {
    Completion {
        artifacts: done.outputs,
        skipped: done.skipped,
    }
}

/// `stem`, or `stem_2`, `stem_3`, ... when an earlier PDF used that folder.
fn unique_folder(used: &mut HashSet<String>, stem: &str) -> String {
    let mut candidate = stem.to_string();
    let mut suffix = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{stem}_{suffix}");
        suffix += 1;
    }
    candidate
}
