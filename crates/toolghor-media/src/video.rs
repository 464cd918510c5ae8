// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Video engine — transcoding and trimming through an `ffmpeg` executable.
//
// Each job gets its own scratch directory: the input bytes are written there,
// ffmpeg is run against it, and the output file is read back. The scratch
// directory is removed when the job finishes, successfully or not.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::OnceCell;
use toolghor_core::engines::VideoEngine;
use toolghor_core::error::{Result, ToolghorError};
use toolghor_core::VideoJob;
use tracing::{debug, info, instrument, warn};

const ENGINE_NAME: &str = "ffmpeg";

/// Keep the tail of ffmpeg's stderr in error messages.
const STDERR_TAIL: usize = 400;

/// `VideoEngine` backed by an ffmpeg binary on disk or on `PATH`.
pub struct FfmpegEngine {
    binary: PathBuf,
    /// Outcome of the one-time `-version` probe: the banner line, or why the
    /// binary could not be used.
    readiness: OnceCell<std::result::Result<String, String>>,
}

impl FfmpegEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            readiness: OnceCell::new(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    async fn probe(&self) -> std::result::Result<String, String> {
        let output = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| format!("cannot run {}: {err}", self.binary.display()))?;

        if !output.status.success() {
            return Err(format!(
                "{} -version exited with {}",
                self.binary.display(),
                output.status
            ));
        }
        let banner = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(banner)
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new(ENGINE_NAME)
    }
}

#[async_trait]
impl VideoEngine for FfmpegEngine {
    #[instrument(skip(self), fields(binary = %self.binary.display()))]
    async fn ensure_ready(&self) -> Result<()> {
        let readiness = self
            .readiness
            .get_or_init(|| async {
                let probed = self.probe().await;
                match &probed {
                    Ok(banner) => info!(%banner, "Video engine ready"),
                    Err(reason) => warn!(%reason, "Video engine unavailable"),
                }
                probed
            })
            .await;

        readiness
            .as_ref()
            .map(|_| ())
            .map_err(|reason| ToolghorError::unavailable(ENGINE_NAME, reason.clone()))
    }

    #[instrument(skip(self, input), fields(input_len = input.len()))]
    async fn process(&self, input: Vec<u8>, input_extension: &str, job: VideoJob) -> Result<Vec<u8>> {
        self.ensure_ready().await?;

        let scratch = tempfile::Builder::new().prefix("toolghor-video-").tempdir()?;
        let input_path = scratch.path().join(with_extension("input", input_extension));
        let output_path = scratch.path().join(output_file_name(input_extension, &job));
        tokio::fs::write(&input_path, &input).await?;

        let args = ffmpeg_args(&input_path, &output_path, &job);
        debug!(?args, "Running ffmpeg");

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| ToolghorError::Video(format!("cannot run ffmpeg: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let start = stderr.len().saturating_sub(STDERR_TAIL);
            let tail = stderr.get(start..).unwrap_or(&stderr).trim();
            return Err(ToolghorError::Video(format!(
                "ffmpeg exited with {}: {tail}",
                output.status
            )));
        }

        let produced = tokio::fs::read(&output_path).await.map_err(|err| {
            ToolghorError::Video(format!("ffmpeg produced no output file: {err}"))
        })?;
        debug!(output_len = produced.len(), "ffmpeg finished");
        Ok(produced)
    }
}

fn with_extension(stem: &str, extension: &str) -> String {
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{extension}")
    }
}

/// Name of ffmpeg's output file inside the scratch directory. ffmpeg picks the
/// output container from this extension.
fn output_file_name(input_extension: &str, job: &VideoJob) -> String {
    match job {
        VideoJob::Convert { target } => with_extension("output", target.extension()),
        VideoJob::Trim { .. } => with_extension("trimmed", input_extension),
    }
}

fn ffmpeg_args(input: &Path, output: &Path, job: &VideoJob) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(input.as_os_str().to_owned());

    if let VideoJob::Trim {
        start_seconds,
        duration_seconds,
    } = job
    {
        args.extend(
            [
                "-ss".to_string(),
                start_seconds.to_string(),
                "-t".to_string(),
                duration_seconds.to_string(),
                "-c".to_string(),
                "copy".to_string(),
            ]
            .map(OsString::from),
        );
    }

    args.push(output.as_os_str().to_owned());
    args
}
