//! Staging: the in-flight half of an upload.
//!
//! Each upload is written to `{root}/staging/<id>` and only moved into
//! `{root}/objects/` once every byte has been written and hashed. A
//! [`StagingFile`] that is dropped without being sealed deletes its file, so
//! an upload that fails at any point (reader error, disk error, size
//! mismatch, caller cancellation) leaves nothing behind.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{DepotError, Result};
use crate::hash::{ContentHash, HashingReader};

/// Write buffer for streaming uploads to disk.
const WRITE_BUFFER: usize = 64 * 1024;

/// A handle to a staging file owned by exactly one upload.
#[derive(Debug)]
pub(crate) struct StagingFile {
    path: PathBuf,
    file: Option<File>,
    sealed: bool,
}

impl StagingFile {
    /// Create the staging file. Fails if the path already exists.
    pub(crate) fn create(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(DepotError::io("failed to create staging prefix directory"))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(DepotError::io("failed to create staging file"))?;

        Ok(Self {
            path,
            file: Some(file),
            sealed: false,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Stream at most `limit` bytes of `reader` into the file, hashing in the
    /// same pass.
    ///
    /// Returns the hash and length of exactly the bytes written. Nothing past
    /// `limit` is pulled from `reader`.
    pub(crate) fn write_from(
        &mut self,
        reader: &mut dyn Read,
        limit: u64,
    ) -> Result<(ContentHash, u64)> {
        let file = self.file.as_mut().ok_or_else(|| DepotError::Io {
            context: "staging file already closed",
            source: io::Error::other("closed"),
        })?;

        let mut tee = HashingReader::new(Read::take(reader, limit));
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER, file);
        io::copy(&mut tee, &mut writer).map_err(DepotError::io("failed to stream upload"))?;
        writer
            .flush()
            .map_err(DepotError::io("failed to flush staging file"))?;

        Ok(tee.finalize())
    }

    /// Sync data to disk (fsync).
    pub(crate) fn sync(&mut self) -> Result<()> {
        if let Some(ref file) = self.file {
            file.sync_all()
                .map_err(DepotError::io("failed to sync staging file"))?;
        }
        Ok(())
    }

    /// Move the staged bytes to `dest`.
    ///
    /// Tries rename() first (O(1) on the same filesystem) and falls back to
    /// copy when the staging and objects directories are on different devices.
    pub(crate) fn seal(mut self, dest: &Path) -> Result<()> {
        // Close before moving.
        self.file = None;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(DepotError::io("failed to create object prefix directory"))?;
        }

        match fs::rename(&self.path, dest) {
            Ok(()) => {
                self.sealed = true;
                Ok(())
            }
            Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
                // The staging copy is left unsealed so drop removes it.
                if let Err(e) = fs::copy(&self.path, dest) {
                    let _ = fs::remove_file(dest);
                    return Err(DepotError::Io {
                        context: "failed to copy staging file",
                        source: e,
                    });
                }
                Ok(())
            }
            Err(e) => Err(DepotError::Io {
                context: "failed to rename staging file",
                source: e,
            }),
        }
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if self.sealed {
            return;
        }
        self.file = None;
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove staging file"
            ),
        }
    }
}
