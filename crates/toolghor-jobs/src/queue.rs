// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Queue store — the ordered list of files the user has loaded.
//
// Identity is ordinal: files are addressed by their current index, and
// removal shifts every later file down by one. Order is insertion order and
// nothing is deduplicated. Readers take a snapshot, so a run in flight never
// observes later mutations.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use toolghor_core::error::{Result, ToolghorError};
use toolghor_core::QueuedFile;
use tracing::{debug, info, warn};

use crate::progress::ProgressReporter;

type QueueListener = Arc<dyn Fn(&QueueView) + Send + Sync>;

/// A file as offered for queueing, before it has been checked.
#[derive(Debug, Clone)]
pub enum RawFile {
    /// A path on disk; must name a readable regular file.
    Path(PathBuf),
    /// Bytes already in memory.
    Memory {
        name: String,
        mime_type: String,
        data: Vec<u8>,
    },
}

impl From<PathBuf> for RawFile {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Result of one `add` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOutcome {
    pub added: usize,
    pub skipped: usize,
}

/// One row of the rendered queue listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntryView {
    pub index: usize,
    pub name: String,
    pub badge: &'static str,
    pub size_hint: Option<u64>,
}

/// What render callbacks receive after every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueView {
    /// Bumped by every mutation; listeners never see it go backwards.
    pub revision: u64,
    pub entries: Vec<QueueEntryView>,
}

impl QueueView {
    fn of(files: &[QueuedFile], revision: u64) -> Self {
        let entries = files
            .iter()
            .enumerate()
            .map(|(index, file)| QueueEntryView {
                index,
                name: file.name.clone(),
                badge: file.kind().badge(),
                size_hint: file.size_hint,
            })
            .collect();
        Self { revision, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Default)]
struct Entries {
    files: Vec<QueuedFile>,
    revision: u64,
}

impl Entries {
    /// Apply a mutation and describe the result under the same lock.
    fn mutate<R>(&mut self, change: impl FnOnce(&mut Vec<QueuedFile>) -> R) -> (R, QueueView) {
        let result = change(&mut self.files);
        self.revision += 1;
        (result, QueueView::of(&self.files, self.revision))
    }
}

/// Owner of the session's file queue.
///
/// Render callbacks are delivered one at a time in mutation order; a view
/// overtaken by a newer one before delivery is dropped. A callback may read
/// the queue or register further callbacks but must not mutate the queue.
pub struct QueueStore {
    entries: Mutex<Entries>,
    listeners: Mutex<Vec<QueueListener>>,
    /// Revision of the last view handed to listeners.
    delivered: Mutex<u64>,
    reporter: Arc<ProgressReporter>,
}

impl QueueStore {
    pub fn new(reporter: Arc<ProgressReporter>) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            listeners: Mutex::new(Vec::new()),
            delivered: Mutex::new(0),
            reporter,
        }
    }

    pub fn reporter(&self) -> &Arc<ProgressReporter> {
        &self.reporter
    }

    /// Append files in order. Entries that cannot be read are skipped and
    /// counted; the rest of the batch is still added.
    pub async fn add(&self, files: impl IntoIterator<Item = RawFile>) -> AddOutcome {
        let mut accepted = Vec::new();
        let mut skipped = 0;

        for raw in files {
            match raw {
                RawFile::Memory {
                    name,
                    mime_type,
                    data,
                } => accepted.push(QueuedFile::from_bytes(name, mime_type, data)),
                RawFile::Path(path) => match QueuedFile::from_path(&path).await {
                    Ok(file) => accepted.push(file),
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "Skipping unreadable file");
                        skipped += 1;
                    }
                },
            }
        }

        let outcome = AddOutcome {
            added: accepted.len(),
            skipped,
        };
        self.push_all(accepted);
        if outcome.added > 0 {
            self.reporter.set_status("Files added");
        }
        info!(added = outcome.added, skipped = outcome.skipped, "Files queued");
        outcome
    }

    /// Append already-built queue entries.
    pub fn push_all(&self, files: Vec<QueuedFile>) {
        let ((), view) = lock(&self.entries).mutate(|queue| queue.extend(files));
        self.notify(&view);
    }

    /// Remove the file at `index`, shifting later files down.
    pub fn remove_at(&self, index: usize) -> Result<QueuedFile> {
        let (removed, view) = {
            let mut entries = lock(&self.entries);
            let len = entries.files.len();
            if index >= len {
                return Err(ToolghorError::QueueIndex { index, len });
            }
            entries.mutate(|queue| queue.remove(index))
        };
        debug!(index, name = %removed.name, "Removed from queue");
        self.notify(&view);
        Ok(removed)
    }

    /// Empty the queue and reset the displayed progress.
    pub fn clear(&self) {
        let ((), view) = lock(&self.entries).mutate(Vec::clear);
        self.reporter.set(0, "Queue cleared");
        self.notify(&view);
    }

    /// The queue as it is right now.
    pub fn snapshot(&self) -> Vec<QueuedFile> {
        lock(&self.entries).files.clone()
    }

    pub fn view(&self) -> QueueView {
        let entries = lock(&self.entries);
        QueueView::of(&entries.files, entries.revision)
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).files.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).files.is_empty()
    }

    /// Register a render callback fired after every add, remove and clear.
    pub fn on_queue_changed<F>(&self, listener: F)
    where
        F: Fn(&QueueView) + Send + Sync + 'static,
    {
        lock(&self.listeners).push(Arc::new(listener));
    }

    fn notify(&self, view: &QueueView) {
        let mut delivered = lock(&self.delivered);
        if view.revision <= *delivered {
            debug!(revision = view.revision, latest = *delivered, "Dropping stale queue view");
            return;
        }
        *delivered = view.revision;
        let listeners = lock(&self.listeners).clone();
        for listener in &listeners {
            listener(view);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
