// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// toolghor-media — Video and archive engines for the ToolGhor toolbox.
//
// The video engine drives an external `ffmpeg` executable; the archive engine
// reads and writes zip files in memory.

pub mod archive;
pub mod video;

pub use archive::ZipArchiver;
pub use video::FfmpegEngine;
