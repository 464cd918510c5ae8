// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR (Optical Character Recognition) for the text extraction tool.
//
// Text recognition uses the `ocrs` crate, a pure-Rust OCR engine backed by
// neural network models executed via `rten`. It is only compiled in with the
// `ocr` feature:
//
// ```toml
// toolghor-document = { path = "crates/toolghor-document", features = ["ocr"] }
// ```
//
// The engine needs two model files, `text-detection.rten` and
// `text-recognition.rten`. Running `ocrs-cli` once downloads them to the
// default cache directory, `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`).

use std::path::{Path, PathBuf};

use toolghor_core::error::{Result, ToolghorError};

/// Well-known filenames for the detection and recognition models.
const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Default directory for cached OCR model files.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Where to find the OCR models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Models named `text-detection.rten` / `text-recognition.rten` in `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Both model files must exist. A missing model means the engine cannot
    /// be initialised at all.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(ToolghorError::unavailable(
                    "OCR engine",
                    format!(
                        "model not found at {}; run `ocrs-cli` once to download models",
                        path.display()
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(feature = "ocr")]
pub use recognizer::OcrsRecognizer;

#[cfg(feature = "ocr")]
mod recognizer {
    use image::DynamicImage;
    use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
    use rten::Model;
    use toolghor_core::error::{Result, ToolghorError};
    use tracing::{debug, info, instrument};

    use super::OcrConfig;

    /// Loaded `ocrs` engine. Model loading is the expensive step; keep one
    /// recognizer around for the whole session.
    ///
    /// `ocrs` and `rten` must be compiled in release mode; debug builds are
    /// 10-100x slower.
    pub struct OcrsRecognizer {
        engine: OcrsEngine,
    }

    impl OcrsRecognizer {
        #[instrument(skip_all, fields(
            detection = %config.detection_model_path.display(),
            recognition = %config.recognition_model_path.display(),
        ))]
        pub fn new(config: &OcrConfig) -> Result<Self> {
            config.validate()?;

            let load = |path: &std::path::Path| {
                Model::load_file(path).map_err(|err| {
                    ToolghorError::unavailable(
                        "OCR engine",
                        format!("failed to load model from {}: {err}", path.display()),
                    )
                })
            };

            info!("Loading OCR models");
            let engine = OcrsEngine::new(OcrEngineParams {
                detection_model: Some(load(&config.detection_model_path)?),
                recognition_model: Some(load(&config.recognition_model_path)?),
                ..Default::default()
            })
            .map_err(|err| {
                ToolghorError::unavailable("OCR engine", format!("initialisation failed: {err}"))
            })?;

            info!("OCR engine initialised");
            Ok(Self { engine })
        }

        /// All recognised text, lines separated by newlines.
        #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
        pub fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
            let rgb = image.to_rgb8();
            let (width, height) = rgb.dimensions();

            let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
                ToolghorError::Ocr(format!(
                    "failed to create image source ({width}x{height}): {err}"
                ))
            })?;
            let input = self
                .engine
                .prepare_input(source)
                .map_err(|err| ToolghorError::Ocr(format!("preprocessing failed: {err}")))?;
            let text = self
                .engine
                .get_text(&input)
                .map_err(|err| ToolghorError::Ocr(format!("text recognition failed: {err}")))?;

            debug!(lines = text.lines().count(), chars = text.len(), "OCR complete");
            Ok(text)
        }
    }
}
