//! FileDepot: filesystem-backed artifact store.
//!
//! Bytes live on disk under `{root}/objects/`, sharded by the first two
//! characters of the artifact id. Metadata lives in an in-memory index
//! guarded by a single `RwLock`; byte streaming happens outside the lock and
//! only the final insert takes it for writing.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::artifact::{Artifact, ArtifactId};
use crate::config::DepotConfig;
use crate::error::{DepotError, Result};
use crate::hash::HashingReader;
use crate::staging::StagingFile;

/// Trait for artifact storage backends.
///
/// The request layer talks to this rather than to `FileDepot` directly, so a
/// database-backed or in-memory store can stand in with the same contract.
pub trait ArtifactStore: Send + Sync {
    /// Persist `reader` to completion under a fresh id.
    ///
    /// The returned `content_hash` is the SHA-256 of exactly the bytes
    /// written. On failure nothing is left on disk.
    fn store(
        &self,
        name: &str,
        description: &str,
        declared_size: u64,
        reader: &mut dyn Read,
        uploader_id: &str,
    ) -> Result<Artifact>;

    /// Look up an artifact by exact id.
    fn get(&self, id: &ArtifactId) -> Result<Artifact>;

    /// Remove an artifact's record and bytes together.
    fn delete(&self, id: &ArtifactId) -> Result<()>;

    /// Open the stored bytes for streaming.
    fn open_for_read(&self, id: &ArtifactId) -> Result<ArtifactReader>;

    /// All artifacts, oldest upload first (ties broken by id).
    fn list(&self) -> Vec<Artifact>;

    /// Number of stored artifacts.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A lazily-read stream over one artifact's bytes.
///
/// The file handle is closed when the reader is dropped, whether it was
/// read to the end or abandoned after an error.
#[derive(Debug)]
pub struct ArtifactReader {
    id: ArtifactId,
    size: u64,
    inner: BufReader<File>,
}

impl ArtifactReader {
    pub fn id(&self) -> &ArtifactId {
        &self.id
    }

    /// Size recorded at store time.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Read for ArtifactReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Filesystem-based artifact store.
#[derive(Debug)]
pub struct FileDepot {
    config: DepotConfig,
    artifacts: RwLock<HashMap<ArtifactId, Artifact>>,
}

impl FileDepot {
    /// Create a FileDepot, creating the objects and staging directories if
    /// they don't exist.
    pub fn new(config: DepotConfig) -> Result<Self> {
        fs::create_dir_all(config.objects_dir())
            .map_err(DepotError::io("failed to create objects directory"))?;
        fs::create_dir_all(config.staging_dir())
            .map_err(DepotError::io("failed to create staging directory"))?;

        Ok(Self {
            config,
            artifacts: RwLock::new(HashMap::new()),
        })
    }

    /// Create a FileDepot rooted at a specific path.
    pub fn at_path(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(DepotConfig::with_root(path))
    }

    pub fn config(&self) -> &DepotConfig {
        &self.config
    }

    /// Re-hash the stored bytes and compare against the recorded hash.
    pub fn verify(&self, id: &ArtifactId) -> Result<bool> {
        let expected = self.get(id)?.content_hash;
        let mut tee = HashingReader::new(self.open_for_read(id)?);
        io::copy(&mut tee, &mut io::sink())
            .map_err(DepotError::io("failed to read artifact for verification"))?;
        let (actual, _) = tee.finalize();

        if actual != expected {
            warn!(artifact.id = %id, expected = %expected, actual = %actual, "artifact hash mismatch");
        }
        Ok(actual == expected)
    }

    fn object_path(&self, id: &ArtifactId) -> PathBuf {
        self.config
            .objects_dir()
            .join(id.prefix())
            .join(id.remainder())
    }

    fn staging_path(&self, id: &ArtifactId) -> PathBuf {
        self.config
            .staging_dir()
            .join(id.prefix())
            .join(id.remainder())
    }

    fn index(&self) -> RwLockReadGuard<'_, HashMap<ArtifactId, Artifact>> {
        self.artifacts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn index_mut(&self) -> RwLockWriteGuard<'_, HashMap<ArtifactId, Artifact>> {
        self.artifacts.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ArtifactStore for FileDepot {
    fn store(
        &self,
        name: &str,
        description: &str,
        declared_size: u64,
        reader: &mut dyn Read,
        uploader_id: &str,
    ) -> Result<Artifact> {
        let id = ArtifactId::generate();
        let _span = tracing::info_span!(
            "lockbox.artifact.store",
            artifact.id = %id,
            artifact.name = %name,
            uploader_id = %uploader_id,
        )
        .entered();

        let mut staging = StagingFile::create(self.staging_path(&id))?;
        // One byte past the declared size is enough to detect an oversized upload.
        let limit = declared_size.saturating_add(1);
        let (content_hash, size) = staging.write_from(reader, limit).inspect_err(|e| {
            warn!(error = %e, "upload aborted, discarding staging file");
        })?;

        if size != declared_size {
            warn!(
                declared_size,
                size,
                staging = %staging.path().display(),
                "upload size mismatch, discarding staging file"
            );
            return Err(DepotError::SizeMismatch {
                declared: declared_size,
                actual: size,
            });
        }

        if self.config.fsync {
            staging.sync()?;
        }

        let storage_location = self.object_path(&id);
        staging.seal(&storage_location)?;

        let artifact = Artifact {
            id: id.clone(),
            name: name.to_string(),
            description: description.to_string(),
            file_size: size,
            content_hash,
            upload_time: Utc::now(),
            uploader_id: uploader_id.to_string(),
            storage_location,
        };

        self.index_mut().insert(id, artifact.clone());

        info!(
            size_bytes = size,
            content_hash = %artifact.content_hash,
            "artifact stored"
        );
        Ok(artifact)
    }

    fn get(&self, id: &ArtifactId) -> Result<Artifact> {
        self.index()
            .get(id)
            .cloned()
            .ok_or_else(|| DepotError::NotFound(id.clone()))
    }

    fn delete(&self, id: &ArtifactId) -> Result<()> {
        // The write lock is held across the unlink so no reader observes a
        // record whose bytes are gone.
        let mut index = self.index_mut();
        let artifact = index
            .remove(id)
            .ok_or_else(|| DepotError::NotFound(id.clone()))?;

        match fs::remove_file(artifact.storage_location()) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(artifact.id = %id, "artifact bytes already missing at delete");
            }
            Err(e) => {
                warn!(artifact.id = %id, error = %e, "failed to remove artifact bytes, restoring record");
                index.insert(id.clone(), artifact);
                return Err(DepotError::Io {
                    context: "failed to remove artifact bytes",
                    source: e,
                });
            }
        }
        drop(index);

        info!(artifact.id = %id, "artifact deleted");
        Ok(())
    }

    fn open_for_read(&self, id: &ArtifactId) -> Result<ArtifactReader> {
        let (path, size) = {
            let index = self.index();
            let artifact = index
                .get(id)
                .ok_or_else(|| DepotError::NotFound(id.clone()))?;
            (artifact.storage_location().to_path_buf(), artifact.file_size)
        };

        let file = File::open(&path).map_err(|e| match e.kind() {
            // Deleted between the lookup and the open.
            io::ErrorKind::NotFound => DepotError::NotFound(id.clone()),
            _ => DepotError::Io {
                context: "failed to open artifact",
                source: e,
            },
        })?;

        debug!(artifact.id = %id, "artifact opened for read");
        Ok(ArtifactReader {
            id: id.clone(),
            size,
            inner: BufReader::new(file),
        })
    }

    fn list(&self) -> Vec<Artifact> {
        let mut artifacts: Vec<Artifact> = self.index().values().cloned().collect();
        artifacts.sort_by(|a, b| {
            a.upload_time
                .cmp(&b.upload_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        artifacts
    }

    fn len(&self) -> usize {
        self.index().len()
    }
}
