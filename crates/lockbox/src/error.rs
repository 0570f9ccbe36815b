//! Unified error for the composed service.

use depot::DepotError;
use thiserror::Error;
use warden::WardenError;

/// The five outcomes an outer layer needs to tell apart.
///
/// A request layer maps these to 404 / 401 / 410 / 500 / 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidCredentials,
    SessionExpired,
    IoFailure,
    ValidationFailure,
}

#[derive(Debug, Error)]
pub enum LockboxError {
    #[error(transparent)]
    Depot(#[from] DepotError),

    #[error(transparent)]
    Warden(#[from] WardenError),
}

impl LockboxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            // A malformed id can never name an artifact.
            LockboxError::Depot(DepotError::NotFound(_) | DepotError::InvalidId(_)) => {
                ErrorKind::NotFound
            }
            LockboxError::Depot(DepotError::SizeMismatch { .. }) => ErrorKind::ValidationFailure,
            LockboxError::Depot(DepotError::Io { .. }) => ErrorKind::IoFailure,

            LockboxError::Warden(WardenError::InvalidCredentials) => ErrorKind::InvalidCredentials,
            LockboxError::Warden(WardenError::SessionExpired) => ErrorKind::SessionExpired,
            LockboxError::Warden(WardenError::NotFound(_)) => ErrorKind::NotFound,
            LockboxError::Warden(WardenError::UsernameTaken(_) | WardenError::InvalidConfig(_)) => {
                ErrorKind::ValidationFailure
            }
            LockboxError::Warden(WardenError::Hashing(_)) => ErrorKind::IoFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, LockboxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use depot::ArtifactId;
    use std::io;

    #[test]
    fn test_kind_mapping() {
        let cases = [
            (LockboxError::from(DepotError::NotFound(ArtifactId::generate())), ErrorKind::NotFound),
            (LockboxError::from(DepotError::InvalidId("../x".into())), ErrorKind::NotFound),
            (
                LockboxError::from(DepotError::SizeMismatch { declared: 3, actual: 2 }),
                ErrorKind::ValidationFailure,
            ),
            (
                LockboxError::from(DepotError::Io {
                    context: "disk",
                    source: io::Error::other("full"),
                }),
                ErrorKind::IoFailure,
            ),
            (LockboxError::from(WardenError::InvalidCredentials), ErrorKind::InvalidCredentials),
            (LockboxError::from(WardenError::SessionExpired), ErrorKind::SessionExpired),
            (
                LockboxError::from(WardenError::UsernameTaken("alice".into())),
                ErrorKind::ValidationFailure,
            ),
        ];

        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn test_display_is_transparent() {
        let err = LockboxError::from(WardenError::InvalidCredentials);
        assert_eq!(err.to_string(), WardenError::InvalidCredentials.to_string());
    }
}
