// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ToolGhor — Core types, error definitions and collaborator traits shared
// across all crates.

pub mod config;
pub mod engines;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use engines::{ArchiveEngine, DocumentEngine, Engines, OcrEngine, RasterEngine, VideoEngine};
pub use error::{Result, ToolghorError};
pub use types::*;
