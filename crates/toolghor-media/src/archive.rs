// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Archive engine — build and unpack zip archives in memory.

use std::io::{Cursor, Read, Write};

use async_trait::async_trait;
use toolghor_core::engines::ArchiveEngine;
use toolghor_core::error::{Result, ToolghorError};
use toolghor_core::ArchiveEntry;
use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// `ArchiveEngine` on top of the `zip` crate.
#[derive(Debug, Clone, Copy)]
pub struct ZipArchiver {
    compression: CompressionMethod,
}

impl ZipArchiver {
    pub fn new(compression: CompressionMethod) -> Self {
        Self { compression }
    }

    /// Write `entries` into a new archive. A later entry with the same name
    /// replaces an earlier one.
    pub fn build(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(self.compression);

        for (position, entry) in entries.iter().enumerate() {
            if entries[position + 1..].iter().any(|later| later.name == entry.name) {
                debug!(name = %entry.name, "Entry superseded by a later one");
                continue;
            }
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|err| archive_error(&entry.name, err))?;
            writer.write_all(&entry.data)?;
        }

        let cursor = writer
            .finish()
            .map_err(|err| ToolghorError::Archive(format!("cannot finish archive: {err}")))?;
        Ok(cursor.into_inner())
    }

    /// Every file entry in archive order, directories skipped.
    pub fn unpack(&self, archive: &[u8]) -> Result<Vec<ArchiveEntry>> {
        let mut zip = ZipArchive::new(Cursor::new(archive))
            .map_err(|err| ToolghorError::Archive(format!("not a readable zip: {err}")))?;

        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let mut file = zip
                .by_index(index)
                .map_err(|err| ToolghorError::Archive(format!("entry #{index}: {err}")))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
            file.read_to_end(&mut data)
                .map_err(|err| archive_error(&name, err))?;
            entries.push(ArchiveEntry { name, data });
        }
        Ok(entries)
    }
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self::new(CompressionMethod::Deflated)
    }
}

fn archive_error(name: &str, err: impl std::fmt::Display) -> ToolghorError {
    ToolghorError::Archive(format!("{name}: {err}"))
}

#[async_trait]
impl ArchiveEngine for ZipArchiver {
    #[instrument(skip_all, fields(entries = entries.len()))]
    async fn create(&self, entries: Vec<ArchiveEntry>) -> Result<Vec<u8>> {
        let archiver = *self;
        tokio::task::spawn_blocking(move || archiver.build(&entries))
            .await
            .map_err(|err| ToolghorError::Io(std::io::Error::other(err)))?
    }

    #[instrument(skip_all, fields(archive_len = archive.len()))]
    async fn extract(&self, archive: Vec<u8>) -> Result<Vec<ArchiveEntry>> {
        let archiver = *self;
        tokio::task::spawn_blocking(move || archiver.unpack(&archive))
            .await
            .map_err(|err| ToolghorError::Io(std::io::Error::other(err)))?
    }
}
