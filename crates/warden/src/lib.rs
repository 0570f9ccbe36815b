//! Credential and session management for Lockbox.
//!
//! Turns a username and secret into an account with a salted, deliberately
//! slow password hash, and turns a successful login into a short-lived bearer
//! token. [`Warden::validate_session`] is the gate a request layer calls before
//! honouring any protected operation.
//!
//! ## Session Lifecycle
//!
//! ```text
//! login()
//!    ↓
//! Active ──(now >= expires_at, checked at validate time)──→ Expired ──→ Absent
//!    │                                                                    ↑
//!    └──────────────────────────── logout() ──────────────────────────────┘
//! ```
//!
//! Sessions are never renewed; a new login always mints a new token. Expiry is
//! evaluated lazily by `validate_session`. [`Warden::purge_expired`] is an
//! optional sweep that frees memory without changing what validation reports.

pub mod clock;
pub mod config;
pub mod error;
pub mod manager;
pub mod password;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::WardenConfig;
pub use error::{Result, WardenError};
pub use manager::Warden;
pub use password::{PasswordHasher, DEFAULT_PBKDF2_ITERATIONS};
pub use types::{Session, SessionToken, User, UserId};
