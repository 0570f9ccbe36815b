//! Credential and session errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WardenError {
    /// Unknown username, wrong secret, or a token that resolves to nothing.
    /// Deliberately carries no detail.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("session expired")]
    SessionExpired,

    #[error("user not found: {0}")]
    NotFound(String),

    #[error("username already taken: {0}")]
    UsernameTaken(String),

    #[error("credential hashing failed: {0}")]
    Hashing(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, WardenError>;
