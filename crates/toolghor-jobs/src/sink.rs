// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Artifact delivery — where finished output files go.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use toolghor_core::Artifact;
use toolghor_core::error::{Result, ToolghorError};
use tracing::{info, instrument, warn};

/// Receives each produced artifact exactly once.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn deliver(&self, artifact: Artifact) -> Result<()>;
}

/// Writes artifacts as files under a root directory.
///
/// Artifact names may contain `/`-separated sub-directories (archive entry
/// paths); those are created as needed. Names that would escape the root are
/// refused. A name delivered twice through the same sink is written as
/// `<stem>_2.<ext>`, then `<stem>_3.<ext>`, instead of overwriting.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    written: Mutex<HashSet<PathBuf>>,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: Mutex::new(HashSet::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `name` would be written, if it is a safe relative path.
    pub fn target_path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let safe = !name.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(ToolghorError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("refusing to write outside the output directory: {name}"),
            )));
        }
        Ok(self.root.join(relative))
    }

    /// `path`, or the first numbered variant of it this sink has not written.
    fn claim(&self, path: PathBuf) -> PathBuf {
        let mut written = self.written.lock().unwrap_or_else(PoisonError::into_inner);
        if written.insert(path.clone()) {
            return path;
        }
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let mut n = 2;
        loop {
            let candidate = path.with_file_name(format!("{stem}_{n}{extension}"));
            if written.insert(candidate.clone()) {
                warn!(
                    requested = %path.display(),
                    written = %candidate.display(),
                    "Output name already used, renaming"
                );
                return candidate;
            }
            n += 1;
        }
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    #[instrument(skip_all, fields(name = %artifact.name, bytes = artifact.data.len()))]
    async fn deliver(&self, artifact: Artifact) -> Result<()> {
        let path = self.claim(self.target_path(&artifact.name)?);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &artifact.data).await?;
        info!(path = %path.display(), "Artifact written");
        Ok(())
    }
}

/// Keeps delivered artifacts in memory, in delivery order.
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<Vec<Artifact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far.
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.artifacts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.artifacts().into_iter().map(|a| a.name).collect()
    }

    /// Remove and return everything delivered so far.
    pub fn take(&self) -> Vec<Artifact> {
        std::mem::take(&mut *self.artifacts.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn deliver(&self, artifact: Artifact) -> Result<()> {
        self.artifacts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(artifact);
        Ok(())
    }
}
