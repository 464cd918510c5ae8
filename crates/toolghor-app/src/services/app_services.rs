// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — owns the loaded configuration and turns it into
// engines, a sink and a dispatcher for the command-line front-end.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use toolghor_core::error::Result;
use toolghor_core::{AppConfig, Engines};
use toolghor_document::ocr::OcrConfig;
use toolghor_document::{LocalDocumentEngine, LocalOcrEngine, LocalRasterEngine};
use toolghor_jobs::{Dispatcher, DirectorySink, ParameterPrompt, QueueStore};
use toolghor_media::{FfmpegEngine, ZipArchiver};
use tracing::info;

use super::data_dir;

pub const CONFIG_FILE: &str = "config.json";

/// Configuration plus the place it was loaded from.
#[derive(Debug, Clone)]
pub struct AppServices {
    config: AppConfig,
    config_path: PathBuf,
}

impl AppServices {
    pub fn new(config: AppConfig, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// `config.json` inside the platform data directory.
    pub fn default_config_path() -> PathBuf {
        data_dir::data_dir().join(CONFIG_FILE)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Write the current configuration back to disk.
    pub fn save_config(&self) -> Result<()> {
        persist_config(&self.config_path, &self.config)?;
        info!(path = %self.config_path.display(), "configuration saved");
        Ok(())
    }

    /// Build the engine set described by the configuration.
    pub fn engines(&self) -> Engines {
        let ocr_config = match &self.config.ocr_model_dir {
            Some(dir) => OcrConfig::from_dir(dir),
            None => OcrConfig::default(),
        };
        Engines {
            documents: Arc::new(LocalDocumentEngine),
            raster: Arc::new(LocalRasterEngine::new(self.config.jpeg_quality)),
            ocr: Arc::new(LocalOcrEngine::new(ocr_config)),
            video: Arc::new(FfmpegEngine::new(&self.config.ffmpeg_path)),
            archive: Arc::new(ZipArchiver::default()),
        }
    }

    /// A dispatcher over `queue` that writes into the configured output
    /// directory.
    pub fn dispatcher(&self, queue: Arc<QueueStore>, prompt: Arc<dyn ParameterPrompt>) -> Dispatcher {
        let sink = Arc::new(DirectorySink::new(&self.config.output_dir));
        Dispatcher::new(queue, self.engines(), prompt, sink)
            .with_exclusive_runs(self.config.exclusive_runs)
    }
}

/// Read the configuration at `path`. A missing file yields the defaults; a
/// file that exists but cannot be parsed is an error.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(err) => return Err(err.into()),
    };
    Ok(serde_json::from_str(&data)?)
}

pub fn persist_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}
