// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Terminal interaction: line-based parameter prompts and the text rendering
// of the queue, progress signal and operation table.

use std::fmt::Write as _;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use toolghor_core::ProgressState;
use toolghor_core::error::{Result, ToolghorError};
use toolghor_jobs::{OperationDescriptor, ParameterPrompt, PromptRequest, PromptResponse, QueueView};

/// Asks each question on stderr and reads the answer as one line.
///
/// An empty line takes the pre-filled default. End of input, or an empty
/// line when there is no default, cancels.
pub struct LinePrompt<R> {
    lines: Mutex<Lines<R>>,
}

impl<R: AsyncBufRead + Unpin> LinePrompt<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
        }
    }
}

impl LinePrompt<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R> ParameterPrompt for LinePrompt<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn ask(&self, request: &PromptRequest) -> Result<PromptResponse> {
        if request.default.is_empty() {
            eprint!("{} ", request.label);
        } else {
            eprint!("{} [{}] ", request.label, request.default);
        }

        let line = self
            .lines
            .lock()
            .await
            .next_line()
            .await
            .map_err(|err| ToolghorError::Interaction(err.to_string()))?;

        Ok(match line.as_deref().map(str::trim) {
            None => PromptResponse::Cancelled,
            Some("") if request.default.is_empty() => PromptResponse::Cancelled,
            Some("") => PromptResponse::Provided(request.default.clone()),
            Some(answer) => PromptResponse::Provided(answer.to_string()),
        })
    }
}

/// One line per queued file: `  1. [PDF] report.pdf (2.0 KiB)`.
pub fn render_queue(view: &QueueView) -> String {
    let mut out = String::new();
    for entry in &view.entries {
        let _ = write!(out, "{:>3}. [{}] {}", entry.index + 1, entry.badge, entry.name);
        if let Some(size) = entry.size_hint {
            let _ = write!(out, " ({})", human_size(size));
        }
        out.push('\n');
    }
    out
}

/// `[ 40%] Rotating PDF...`
pub fn render_progress(state: &ProgressState) -> String {
    format!("[{:>3}%] {}", state.percent, state.message)
}

/// The operation table printed by `toolghor list`.
pub fn render_operations<'a>(operations: impl IntoIterator<Item = &'a OperationDescriptor>) -> String {
    let mut out = String::new();
    for op in operations {
        let _ = writeln!(out, "{:<15} {}", op.id.slug(), op.display_name);
        for param in op.parameters {
            let _ = writeln!(out, "{:<15}   --param  {}", "", param.label);
        }
    }
    out
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
