//! Artifact content store for Lockbox.
//!
//! Persists uploaded artifacts under random, unguessable identifiers and
//! annotates each one with the SHA-256 of the bytes that actually landed on
//! disk. The hash is computed while the upload is written, never in a second
//! pass over the input.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use depot::{ArtifactStore, DepotConfig, FileDepot};
//! use std::io::Read;
//!
//! let depot = FileDepot::new(DepotConfig::from_env()).unwrap();
//!
//! let data = b"Hello, World!";
//! let artifact = depot
//!     .store("hello.txt", "greeting", data.len() as u64, &mut &data[..], "user-1")
//!     .unwrap();
//! println!("Stored {} as {}", artifact.id, artifact.content_hash);
//!
//! let mut bytes = Vec::new();
//! depot.open_for_read(&artifact.id).unwrap().read_to_end(&mut bytes).unwrap();
//! ```
//!
//! # Layout
//!
//! ```text
//! {root}/
//! ├── objects/
//! │   └── 3f/a09c...   # sealed artifact bytes, named by id
//! └── staging/
//!     └── 71/0be4...   # uploads still in flight
//! ```
//!
//! Metadata lives in memory only. Staging files never outlive a failed store.

pub mod artifact;
pub mod config;
pub mod error;
pub mod hash;
mod staging;
pub mod store;

pub use artifact::{Artifact, ArtifactId};
pub use config::DepotConfig;
pub use error::{DepotError, Result};
pub use hash::{ContentHash, HashError, HashingReader};
pub use store::{ArtifactReader, ArtifactStore, FileDepot};
