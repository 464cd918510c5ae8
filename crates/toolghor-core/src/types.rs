// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the ToolGhor file toolbox.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Identifier for one operation invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a queued file's bytes live. Reading never consumes the source.
#[derive(Debug, Clone)]
pub enum ByteSource {
    /// Bytes already held in memory.
    Memory(Arc<[u8]>),
    /// A file on disk, read on demand.
    Path(PathBuf),
}

impl ByteSource {
    /// Read the full payload.
    pub async fn read(&self) -> Result<Vec<u8>> {
        match self {
            Self::Memory(bytes) => Ok(bytes.to_vec()),
            Self::Path(path) => Ok(tokio::fs::read(path).await?),
        }
    }
}

/// Coarse media family, used for the queue listing badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Pdf,
    Image,
    Video,
    Zip,
    Other,
}

impl MediaKind {
    /// Classify by substring of the mime type, in badge precedence order.
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.contains("pdf") {
            Self::Pdf
        } else if mime_type.contains("image") {
            Self::Image
        } else if mime_type.contains("video") {
            Self::Video
        } else if mime_type.contains("zip") {
            Self::Zip
        } else {
            Self::Other
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Image => "IMG",
            Self::Video => "VID",
            Self::Zip => "ZIP",
            Self::Other => "FILE",
        }
    }
}

/// Guess a mime type from a file extension. Unknown extensions give `""`,
/// matching what a browser reports for files it cannot classify.
pub fn mime_from_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "zip" => "application/zip",
        "txt" => "text/plain",
        _ => "",
    }
}

/// A user-supplied file waiting in the queue. Never mutated once queued.
#[derive(Debug, Clone)]
pub struct QueuedFile {
    pub name: String,
    /// Reported mime type; may be empty or wrong.
    pub mime_type: String,
    pub source: ByteSource,
    pub size_hint: Option<u64>,
}

impl QueuedFile {
    /// Queue entry backed by in-memory bytes.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_hint: Some(bytes.len() as u64),
            source: ByteSource::Memory(Arc::from(bytes)),
        }
    }

    /// Queue entry backed by a file on disk. Fails if the path is not a
    /// readable regular file.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )
            .into());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = path
            .extension()
            .map(|ext| mime_from_extension(&ext.to_string_lossy()))
            .unwrap_or("");

        Ok(Self {
            name,
            mime_type: mime_type.to_string(),
            source: ByteSource::Path(path.to_path_buf()),
            size_hint: Some(metadata.len()),
        })
    }

    /// Read the file's bytes.
    pub async fn read(&self) -> Result<Vec<u8>> {
        self.source.read().await
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime_type)
    }

    /// Name without its final extension (`report.v2.pdf` -> `report.v2`).
    pub fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(0) | None => &self.name,
            Some(dot) => &self.name[..dot],
        }
    }

    /// Final extension without the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        match self.name.rfind('.') {
            Some(0) | None => None,
            Some(dot) => Some(&self.name[dot + 1..]),
        }
    }
}

/// A produced output file handed to the delivery sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
            created_at: Utc::now(),
        }
    }
}

/// One file inside a zip archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// The single process-wide (percent, message) status signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    /// 0..=100.
    pub percent: u8,
    pub message: String,
}

/// Classification of errors as presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Empty selection or bad parameter; nothing was touched.
    Validation,
    /// A collaborator failed on a file; the rest of the run is halted.
    PerFileProcessing,
    /// A collaborator could not be initialised at all.
    EnvironmentUnavailable,
}

/// Target format for raster image conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageTarget {
    Png,
    Jpg,
    Webp,
}

impl ImageTarget {
    pub const ALL: [Self; 3] = [Self::Png, Self::Jpg, Self::Webp];

    /// Parse the user-facing keyword (`png`, `jpg`, `webp`).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.extension() == keyword)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Webp => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }
}

/// Target container for video conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoTarget {
    Mp4,
    Webm,
    Avi,
}

impl VideoTarget {
    pub const ALL: [Self; 3] = [Self::Mp4, Self::Webm, Self::Avi];

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.extension() == keyword)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Avi => "avi",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
            Self::Avi => "video/x-msvideo",
        }
    }
}

/// Work handed to the video engine for a single file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VideoJob {
    /// Re-encode into another container.
    Convert { target: VideoTarget },
    /// Stream-copy a window of the input.
    Trim { start_seconds: f64, duration_seconds: f64 },
}
