//! Lockbox: authenticated artifact storage.
//!
//! Composes the content store ([`depot`]) and the credential and session
//! manager ([`warden`]) behind one call per endpoint. Every artifact call
//! presents a bearer token; the session is validated before the store is
//! touched, and the session's user becomes the uploader of record.
//!
//! # Startup
//!
//! ```rust,no_run
//! use lockbox::{spawn_session_sweeper, telemetry, Lockbox};
//! use lockconf::LockConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = LockConfig::load()?;
//! telemetry::init(&config.telemetry.log_level)?;
//!
//! let lockbox = Lockbox::from_config(&config)?;
//! let shutdown = CancellationToken::new();
//! if let Some(interval) = config.sweep_interval() {
//!     spawn_session_sweeper(lockbox.warden().clone(), interval, shutdown.clone());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Failures carry an [`ErrorKind`] so a request layer can map them to
//! status codes without inspecting either crate's error type.

pub mod error;
pub mod service;
pub mod sweeper;
pub mod telemetry;

pub use error::{ErrorKind, LockboxError, Result};
pub use service::{depot_config, warden_config, Lockbox};
pub use sweeper::spawn_session_sweeper;
