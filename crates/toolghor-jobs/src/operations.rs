// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The operation table: what each tool selects from the queue, what it says
// when nothing matches, how it reports progress, and how it delivers.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use toolghor_core::QueuedFile;
use toolghor_core::error::ToolghorError;

/// Every user-invocable tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationId {
    MergePdfs,
    ImagesToPdf,
    PdfToImages,
    RotatePdf,
    DeletePages,
    ReorderPages,
    ConvertImage,
    ExtractText,
    ConvertVideo,
    TrimVideo,
    CreateZip,
    ExtractZip,
}

impl OperationId {
    pub const ALL: [Self; 12] = [
        Self::MergePdfs,
        Self::ImagesToPdf,
        Self::PdfToImages,
        Self::RotatePdf,
        Self::DeletePages,
        Self::ReorderPages,
        Self::ConvertImage,
        Self::ExtractText,
        Self::ConvertVideo,
        Self::TrimVideo,
        Self::CreateZip,
        Self::ExtractZip,
    ];

    /// Command-line name, e.g. `merge-pdfs`.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::MergePdfs => "merge-pdfs",
            Self::ImagesToPdf => "images-to-pdf",
            Self::PdfToImages => "pdf-to-images",
            Self::RotatePdf => "rotate-pdf",
            Self::DeletePages => "delete-pages",
            Self::ReorderPages => "reorder-pages",
            Self::ConvertImage => "convert-image",
            Self::ExtractText => "extract-text",
            Self::ConvertVideo => "convert-video",
            Self::TrimVideo => "trim-video",
            Self::CreateZip => "create-zip",
            Self::ExtractZip => "extract-zip",
        }
    }

    pub fn descriptor(&self) -> &'static OperationDescriptor {
        // `ALL` and `DESCRIPTORS` are declared in the same order.
        &DESCRIPTORS[*self as usize]
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for OperationId {
    type Err = ToolghorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.slug() == s)
            .ok_or_else(|| ToolghorError::validation(format!("Unknown operation: {s}")))
    }
}

/// Which queued files an operation works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Selection {
    /// mime is exactly `application/pdf`.
    Pdf,
    /// mime is `application/pdf`, or the name ends in `.pdf`.
    PdfOrSuffix,
    /// mime starts with `image/`.
    Image,
    /// mime starts with `image/` or is exactly `application/pdf`.
    ImageOrPdf,
    /// mime starts with `video/`.
    Video,
    /// name ends in `.zip`.
    ZipSuffix,
    /// The whole queue.
    Everything,
}

impl Selection {
    pub fn matches(&self, file: &QueuedFile) -> bool {
        let mime = file.mime_type.as_str();
        match self {
            Self::Pdf => is_pdf(mime),
            Self::PdfOrSuffix => is_pdf(mime) || file.name.ends_with(".pdf"),
            Self::Image => is_image(mime),
            Self::ImageOrPdf => is_image(mime) || is_pdf(mime),
            Self::Video => mime.starts_with("video/"),
            Self::ZipSuffix => file.name.ends_with(".zip"),
            Self::Everything => true,
        }
    }
}

pub(crate) fn is_pdf(mime: &str) -> bool {
    mime == "application/pdf"
}

pub(crate) fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Percent span a run's processing loop advances through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressRange {
    pub start: u8,
    pub end: u8,
}

impl ProgressRange {
    pub const fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }

    /// `start + floor(completed / total * (end - start))`.
    pub fn percent_after(&self, completed: usize, total: usize) -> u8 {
        if total == 0 {
            return self.start;
        }
        let completed = completed.min(total);
        let span = usize::from(self.end.saturating_sub(self.start));
        // `completed * span / total <= span <= 100`.
        self.start + (completed * span / total) as u8
    }
}

/// Whether a run hands over one artifact per input or one for the lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMode {
    PerFile,
    Aggregate,
}

/// A prompt an operation shows before processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    pub label: &'static str,
    pub default: &'static str,
    /// Status shown when the prompt is cancelled or answered badly.
    pub invalid_message: &'static str,
}

pub const ANGLE_PARAM: ParameterSpec = ParameterSpec {
    label: "Rotation angle (90, 180, 270):",
    default: "90",
    invalid_message: "Invalid angle",
};

pub const PAGE_LIST_PARAM: ParameterSpec = ParameterSpec {
    label: "Pages to delete (e.g., 1,3,5 or 2-4):",
    default: "",
    invalid_message: "Invalid page list",
};

pub const PAGE_ORDER_PARAM: ParameterSpec = ParameterSpec {
    label: "New page order (e.g., 3,1,2,4):",
    default: "",
    invalid_message: "Invalid page order",
};

pub const IMAGE_FORMAT_PARAM: ParameterSpec = ParameterSpec {
    label: "Convert to format (png, jpg, webp):",
    default: "png",
    invalid_message: "Invalid format",
};

pub const VIDEO_FORMAT_PARAM: ParameterSpec = ParameterSpec {
    label: "Convert to format (mp4, webm, avi):",
    default: "mp4",
    invalid_message: "Invalid format",
};

pub const START_TIME_PARAM: ParameterSpec = ParameterSpec {
    label: "Start time (HH:MM:SS or MM:SS):",
    default: "00:00:00",
    invalid_message: "Invalid start time",
};

pub const END_TIME_PARAM: ParameterSpec = ParameterSpec {
    label: "End time (HH:MM:SS or MM:SS):",
    default: "00:00:10",
    invalid_message: "Invalid end time",
};

/// Static description of one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationDescriptor {
    pub id: OperationId,
    pub display_name: &'static str,
    pub selection: Selection,
    pub empty_message: &'static str,
    pub parameters: &'static [ParameterSpec],
    pub start_message: &'static str,
    pub progress: ProgressRange,
    pub completion_message: &'static str,
    pub delivery: DeliveryMode,
}

impl OperationDescriptor {
    pub fn requires_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }
}

const NO_PARAMS: &[ParameterSpec] = &[];
const WIDE: ProgressRange = ProgressRange::new(10, 100);

static DESCRIPTORS: [OperationDescriptor; 12] = [
    OperationDescriptor {
        id: OperationId::MergePdfs,
        display_name: "Merge PDFs",
        selection: Selection::Pdf,
        empty_message: "No PDFs in queue",
        parameters: NO_PARAMS,
        start_message: "Merging PDFs...",
        progress: ProgressRange::new(5, 95),
        completion_message: "Merge complete",
        delivery: DeliveryMode::Aggregate,
    },
    OperationDescriptor {
        id: OperationId::ImagesToPdf,
        display_name: "Images to PDF",
        selection: Selection::Image,
        empty_message: "No images in queue",
        parameters: NO_PARAMS,
        start_message: "Converting images to PDF...",
        progress: ProgressRange::new(5, 95),
        completion_message: "Conversion complete",
        delivery: DeliveryMode::Aggregate,
    },
    OperationDescriptor {
        id: OperationId::PdfToImages,
        display_name: "PDF to Images",
        selection: Selection::PdfOrSuffix,
        empty_message: "No PDFs in queue",
        parameters: NO_PARAMS,
        start_message: "Converting PDF to images...",
        progress: WIDE,
        completion_message: "Images saved",
        delivery: DeliveryMode::Aggregate,
    },
    OperationDescriptor {
        id: OperationId::RotatePdf,
        display_name: "Rotate PDF",
        selection: Selection::Pdf,
        empty_message: "No PDFs in queue",
        parameters: &[ANGLE_PARAM],
        start_message: "Rotating PDF...",
        progress: WIDE,
        completion_message: "Rotation complete",
        delivery: DeliveryMode::PerFile,
    },
    OperationDescriptor {
        id: OperationId::DeletePages,
        display_name: "Delete Pages",
        selection: Selection::Pdf,
        empty_message: "No PDFs in queue",
        parameters: &[PAGE_LIST_PARAM],
        start_message: "Deleting pages...",
        progress: WIDE,
        completion_message: "Pages deleted",
        delivery: DeliveryMode::PerFile,
    },
    OperationDescriptor {
        id: OperationId::ReorderPages,
        display_name: "Reorder Pages",
        selection: Selection::Pdf,
        empty_message: "No PDFs in queue",
        parameters: &[PAGE_ORDER_PARAM],
        start_message: "Reordering pages...",
        progress: WIDE,
        completion_message: "Pages reordered",
        delivery: DeliveryMode::PerFile,
    },
    OperationDescriptor {
        id: OperationId::ConvertImage,
        display_name: "Convert Format",
        selection: Selection::Image,
        empty_message: "No images in queue",
        parameters: &[IMAGE_FORMAT_PARAM],
        start_message: "Converting images...",
        progress: WIDE,
        completion_message: "Conversion complete",
        delivery: DeliveryMode::PerFile,
    },
    OperationDescriptor {
        id: OperationId::ExtractText,
        display_name: "Extract Text (OCR)",
        selection: Selection::ImageOrPdf,
        empty_message: "No images or PDFs in queue",
        parameters: NO_PARAMS,
        start_message: "Extracting text...",
        progress: WIDE,
        completion_message: "Text extraction complete",
        delivery: DeliveryMode::Aggregate,
    },
    OperationDescriptor {
        id: OperationId::ConvertVideo,
        display_name: "Convert Video",
        selection: Selection::Video,
        empty_message: "No videos in queue",
        parameters: &[VIDEO_FORMAT_PARAM],
        start_message: "Initializing video converter...",
        progress: ProgressRange::new(5, 100),
        completion_message: "Video conversion complete",
        delivery: DeliveryMode::PerFile,
    },
    OperationDescriptor {
        id: OperationId::TrimVideo,
        display_name: "Trim Video",
        selection: Selection::Video,
        empty_message: "No videos in queue",
        parameters: &[START_TIME_PARAM, END_TIME_PARAM],
        start_message: "Initializing video trimmer...",
        progress: ProgressRange::new(5, 100),
        completion_message: "Video trimming complete",
        delivery: DeliveryMode::PerFile,
    },
    OperationDescriptor {
        id: OperationId::CreateZip,
        display_name: "Create ZIP",
        selection: Selection::Everything,
        empty_message: "No files in queue",
        parameters: NO_PARAMS,
        start_message: "Creating ZIP...",
        progress: ProgressRange::new(10, 90),
        completion_message: "ZIP created",
        delivery: DeliveryMode::Aggregate,
    },
    OperationDescriptor {
        id: OperationId::ExtractZip,
        display_name: "Extract ZIP",
        selection: Selection::ZipSuffix,
        empty_message: "No ZIP files in queue",
        parameters: NO_PARAMS,
        start_message: "Extracting ZIP...",
        progress: WIDE,
        completion_message: "ZIP extraction complete",
        delivery: DeliveryMode::PerFile,
    },
];
