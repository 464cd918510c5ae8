// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for ToolGhor.

use thiserror::Error;

use crate::types::ErrorClass;

/// Top-level error type for all ToolGhor operations.
#[derive(Debug, Error)]
pub enum ToolghorError {
    // -- Validation --
    /// Rejected before any file was touched. The message is shown verbatim.
    #[error("{0}")]
    Validation(String),

    #[error("queue index {index} out of range (queue has {len} files)")]
    QueueIndex { index: usize, len: usize },

    // -- Collaborator failures --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("video processing failed: {0}")]
    Video(String),

    #[error("archive operation failed: {0}")]
    Archive(String),

    #[error("{engine} unavailable: {reason}")]
    EnvironmentUnavailable { engine: String, reason: String },

    // -- Plumbing --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parameter prompt failed: {0}")]
    Interaction(String),
}

impl ToolghorError {
    /// Shorthand for a validation rejection.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for an engine that could not be initialised.
    pub fn unavailable(engine: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvironmentUnavailable {
            engine: engine.into(),
            reason: reason.into(),
        }
    }

    /// Where this error sits in the user-facing taxonomy.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) | Self::QueueIndex { .. } => ErrorClass::Validation,
            Self::EnvironmentUnavailable { .. } => ErrorClass::EnvironmentUnavailable,
            Self::Pdf(_)
            | Self::Image(_)
            | Self::Ocr(_)
            | Self::Video(_)
            | Self::Archive(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Config(_)
            | Self::Interaction(_) => ErrorClass::PerFileProcessing,
        }
    }

    /// Text for the status line. Validation messages are shown as-is,
    /// everything else is prefixed with `Error: `.
    pub fn status_text(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            other => format!("Error: {other}"),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ToolghorError>;
