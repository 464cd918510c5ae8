// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory that receives delivered artifacts.
    pub output_dir: PathBuf,
    /// Executable used by the video engine.
    pub ffmpeg_path: PathBuf,
    /// Directory holding the OCR detection/recognition models. `None` uses
    /// the engine's cache directory.
    pub ocr_model_dir: Option<PathBuf>,
    /// JPEG encoder quality (1-100).
    pub jpeg_quality: u8,
    /// Serialise operation invocations instead of letting them race.
    pub exclusive_runs: bool,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("toolghor-output"),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ocr_model_dir: None,
            jpeg_quality: 90,
            exclusive_runs: false,
            log_filter: "info".to_string(),
        }
    }
}
