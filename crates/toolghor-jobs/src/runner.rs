// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-file processing loop.
//
// Files are handled strictly in order. After each one the reporter advances
// through the run's progress range. The first error halts the loop and is
// returned to the caller; a unit may instead report the file as skipped, in
// which case its status is shown and the loop moves on.

use std::future::Future;

use toolghor_core::QueuedFile;
use toolghor_core::error::Result;
use tracing::{debug, warn};

use crate::operations::ProgressRange;
use crate::progress::ProgressReporter;

/// Result of one unit of work.
#[derive(Debug)]
pub enum Unit<T> {
    Produced(T),
    /// The file was left alone; the message becomes the status text.
    Skipped(String),
}

/// Everything a finished loop produced.
#[derive(Debug)]
pub struct Processed<T> {
    pub outputs: Vec<T>,
    /// Names of the files that were skipped.
    pub skipped: Vec<String>,
}

/// Drives `unit` over `files` within `range`.
pub struct ProcessingLoop<'a> {
    reporter: &'a ProgressReporter,
    range: ProgressRange,
}

impl<'a> ProcessingLoop<'a> {
    pub fn new(reporter: &'a ProgressReporter, range: ProgressRange) -> Self {
        Self { reporter, range }
    }

    pub async fn run<'f, T, F, Fut>(&self, files: &'f [QueuedFile], mut unit: F) -> Result<Processed<T>>
    where
        F: FnMut(&'f QueuedFile) -> Fut,
        Fut: Future<Output = Result<Unit<T>>>,
    {
        let total = files.len();
        let mut processed = Processed {
            outputs: Vec::with_capacity(total),
            skipped: Vec::new(),
        };

        for (position, file) in files.iter().enumerate() {
            debug!(position, total, name = %file.name, "Processing file");
            let outcome = unit(file).await.inspect_err(|err| {
                warn!(position, name = %file.name, error = %err, "File failed, halting run");
            })?;
            match outcome {
                Unit::Produced(output) => processed.outputs.push(output),
                Unit::Skipped(status) => {
                    warn!(name = %file.name, %status, "File skipped");
                    self.reporter.set_status(status);
                    processed.skipped.push(file.name.clone());
                }
            }
            self.reporter
                .set_percent(self.range.percent_after(position + 1, total));
        }

        Ok(processed)
    }
}
