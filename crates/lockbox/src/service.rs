//! Session-gated access to the artifact store.

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use depot::{Artifact, ArtifactId, ArtifactReader, ArtifactStore, DepotConfig, FileDepot};
use lockconf::LockConfig;
use tracing::info;
use warden::{Session, User, Warden, WardenConfig};

use crate::error::Result;

/// The two stores behind one set of per-endpoint calls.
///
/// Every artifact operation validates the caller's bearer token first, so an
/// expired or unknown token never reaches the store.
#[derive(Clone)]
pub struct Lockbox {
    store: Arc<dyn ArtifactStore>,
    warden: Arc<Warden>,
}

impl std::fmt::Debug for Lockbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lockbox")
            .field("artifacts", &self.store.len())
            .field("sessions", &self.warden.session_count())
            .finish()
    }
}

impl Lockbox {
    pub fn new(store: Arc<dyn ArtifactStore>, warden: Arc<Warden>) -> Self {
        Self { store, warden }
    }

    /// Build a file-backed store and a Warden from loaded configuration.
    pub fn from_config(config: &LockConfig) -> anyhow::Result<Self> {
        let store = FileDepot::new(depot_config(config)).with_context(|| {
            format!(
                "Failed to open artifact store at {}",
                config.paths.storage_dir.display()
            )
        })?;
        let warden = Warden::new(warden_config(config)).context("Invalid [auth] settings")?;

        info!(
            storage_dir = %config.paths.storage_dir.display(),
            session_ttl_secs = config.auth.session_ttl_secs,
            "lockbox ready"
        );
        Ok(Self::new(Arc::new(store), Arc::new(warden)))
    }

    pub fn warden(&self) -> &Arc<Warden> {
        &self.warden
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    pub fn create_user(&self, username: &str, secret: &str, role: &str) -> Result<User> {
        Ok(self.warden.create_user(username, secret, role)?)
    }

    pub fn login(&self, username: &str, secret: &str) -> Result<Session> {
        Ok(self.warden.login(username, secret)?)
    }

    pub fn logout(&self, token: &str) {
        self.warden.logout(token);
    }

    /// Stream an upload into the store, recorded under the session's user.
    pub fn upload(
        &self,
        token: &str,
        name: &str,
        description: &str,
        size: u64,
        reader: &mut dyn Read,
    ) -> Result<Artifact> {
        let user = self.warden.validate_session(token)?;
        Ok(self
            .store
            .store(name, description, size, reader, user.id.as_str())?)
    }

    pub fn artifact(&self, token: &str, id: &str) -> Result<Artifact> {
        self.warden.validate_session(token)?;
        Ok(self.store.get(&id.parse::<ArtifactId>()?)?)
    }

    pub fn artifacts(&self, token: &str) -> Result<Vec<Artifact>> {
        self.warden.validate_session(token)?;
        Ok(self.store.list())
    }

    pub fn download(&self, token: &str, id: &str) -> Result<ArtifactReader> {
        self.warden.validate_session(token)?;
        Ok(self.store.open_for_read(&id.parse::<ArtifactId>()?)?)
    }

    pub fn remove(&self, token: &str, id: &str) -> Result<()> {
        let user = self.warden.validate_session(token)?;
        let id = id.parse::<ArtifactId>()?;
        self.store.delete(&id)?;
        info!(artifact.id = %id, user_id = %user.id, "artifact removed by request");
        Ok(())
    }
}

/// Content store settings from `[paths]` and `[store]`.
pub fn depot_config(config: &LockConfig) -> DepotConfig {
    DepotConfig::with_root(&config.paths.storage_dir).fsync(config.store.fsync)
}

/// Credential settings from `[auth]`.
pub fn warden_config(config: &LockConfig) -> WardenConfig {
    WardenConfig::default()
        .session_ttl(config.session_ttl())
        .pbkdf2_iterations(config.auth.pbkdf2_iterations)
}
