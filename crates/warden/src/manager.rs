//! Warden: owns users and sessions.
//!
//! Users sit behind one `RwLock` holding both the id map and the username
//! index, so the uniqueness check and the insert happen under the same write
//! guard. Sessions live in a `DashMap` keyed by token.
//!
//! A sweep does not change what validation reports. Expired sessions it
//! removes leave a tombstone (token and expiry time) behind, so the next
//! validation of that token still answers `SessionExpired` once.
//!
//! Spans emitted:
//! - `lockbox.user.create`
//! - `lockbox.session.create` - successful login
//! - `lockbox.session.validate`
//! - `lockbox.session.terminate` - explicit logout

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::WardenConfig;
use crate::error::{Result, WardenError};
use crate::password::PasswordHasher;
use crate::types::{redact, Session, SessionToken, User, UserId};

#[derive(Debug, Default)]
struct UserTable {
    by_id: HashMap<UserId, User>,
    by_name: HashMap<String, UserId>,
}

impl UserTable {
    fn find_by_name(&self, username: &str) -> Option<&User> {
        self.by_name.get(username).and_then(|id| self.by_id.get(id))
    }
}

/// Credential and session manager.
#[derive(Debug)]
pub struct Warden {
    ttl: Duration,
    hasher: PasswordHasher,
    /// Verified against on unknown usernames so a miss costs a full hash.
    decoy_hash: String,
    clock: Arc<dyn Clock>,
    users: RwLock<UserTable>,
    sessions: DashMap<String, Session>,
    /// Swept expired tokens not yet reported, with their expiry time.
    expired: DashMap<String, DateTime<Utc>>,
}

impl Warden {
    /// Create a Warden on the system clock.
    pub fn new(config: WardenConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a Warden with an injected clock.
    pub fn with_clock(config: WardenConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        if config.pbkdf2_iterations == 0 {
            return Err(WardenError::InvalidConfig(
                "pbkdf2_iterations must be positive".to_string(),
            ));
        }
        let ttl = Duration::from_std(config.session_ttl)
            .ok()
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| {
                WardenError::InvalidConfig(format!(
                    "session_ttl out of range: {:?}",
                    config.session_ttl
                ))
            })?;

        let hasher = PasswordHasher::new(config.pbkdf2_iterations);
        let decoy_hash = hasher.hash(SessionToken::generate().as_str())?;

        Ok(Self {
            ttl,
            hasher,
            decoy_hash,
            clock,
            users: RwLock::new(UserTable::default()),
            sessions: DashMap::new(),
            expired: DashMap::new(),
        })
    }

    /// Register a new account.
    ///
    /// Usernames are unique; a taken name fails with `UsernameTaken`. The
    /// secret is hashed before the user is stored and is not retained.
    pub fn create_user(&self, username: &str, secret: &str, role: &str) -> Result<User> {
        let _span = tracing::info_span!("lockbox.user.create", username = %username, role = %role)
            .entered();

        // Cheap early rejection; the authoritative check is under the write lock.
        if self.users().by_name.contains_key(username) {
            return Err(WardenError::UsernameTaken(username.to_string()));
        }

        let password_hash = self.hasher.hash(secret)?;
        let user = User {
            id: UserId::generate(),
            username: username.to_string(),
            password_hash,
            role: role.to_string(),
            created_at: self.clock.now(),
        };

        let mut users = self.users_mut();
        if users.by_name.contains_key(username) {
            return Err(WardenError::UsernameTaken(username.to_string()));
        }
        users.by_name.insert(user.username.clone(), user.id.clone());
        users.by_id.insert(user.id.clone(), user.clone());
        drop(users);

        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Authenticate and mint a new session.
    ///
    /// Unknown usernames and wrong secrets fail identically with
    /// `InvalidCredentials`, after the same amount of hashing work.
    pub fn login(&self, username: &str, secret: &str) -> Result<Session> {
        let candidate = self.users().find_by_name(username).cloned();

        let user = match candidate {
            Some(user) if PasswordHasher::verify(secret, &user.password_hash) => user,
            Some(_) => {
                debug!("login rejected");
                return Err(WardenError::InvalidCredentials);
            }
            None => {
                let _ = PasswordHasher::verify(secret, &self.decoy_hash);
                debug!("login rejected");
                return Err(WardenError::InvalidCredentials);
            }
        };

        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| WardenError::InvalidConfig("session expiry overflows".to_string()))?;
        let session = Session {
            token: SessionToken::generate(),
            user_id: user.id.clone(),
            created_at: now,
            expires_at,
        };

        let _span = tracing::info_span!(
            "lockbox.session.create",
            user_id = %user.id,
            token = %session.token.redacted(),
        )
        .entered();

        self.sessions
            .insert(session.token.as_str().to_string(), session.clone());
        info!(expires_at = %session.expires_at, "session created");
        Ok(session)
    }

    /// End a session. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) {
        self.expired.remove(token);
        if let Some((_, session)) = self.sessions.remove(token) {
            let _span = tracing::info_span!(
                "lockbox.session.terminate",
                user_id = %session.user_id,
                token = %redact(token),
            )
            .entered();
            info!("session terminated");
        }
    }

    /// Resolve a token to the user that owns it.
    ///
    /// - unknown token: `InvalidCredentials`
    /// - expired (live or swept): purged, `SessionExpired`
    /// - owner no longer exists: purged, `InvalidCredentials`
    pub fn validate_session(&self, token: &str) -> Result<User> {
        let _span =
            tracing::debug_span!("lockbox.session.validate", token = %redact(token)).entered();

        // Clone out so the shard guard is released before any removal.
        let Some(session) = self.sessions.get(token).map(|entry| entry.value().clone()) else {
            return match self.expired.remove(token) {
                Some((_, expired_at)) => {
                    info!(expired_at = %expired_at, "swept session expired, reported");
                    Err(WardenError::SessionExpired)
                }
                None => Err(WardenError::InvalidCredentials),
            };
        };

        if session.is_expired_at(self.clock.now()) {
            self.sessions.remove(token);
            self.expired.remove(token);
            info!(user_id = %session.user_id, "session expired, purged");
            return Err(WardenError::SessionExpired);
        }

        match self.user(&session.user_id) {
            Some(user) => Ok(user),
            None => {
                self.sessions.remove(token);
                info!(user_id = %session.user_id, "session owner gone, purged");
                Err(WardenError::InvalidCredentials)
            }
        }
    }

    /// Remove an account. Its sessions stop validating immediately and are
    /// purged on their next use or sweep.
    pub fn delete_user(&self, id: &UserId) -> Result<()> {
        let mut users = self.users_mut();
        let user = users
            .by_id
            .remove(id)
            .ok_or_else(|| WardenError::NotFound(id.to_string()))?;
        users.by_name.remove(&user.username);
        drop(users);

        info!(user_id = %id, "user deleted");
        Ok(())
    }

    pub fn user(&self, id: &UserId) -> Option<User> {
        self.users().by_id.get(id).cloned()
    }

    pub fn find_user(&self, username: &str) -> Option<User> {
        self.users().find_by_name(username).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.users().by_id.len()
    }

    /// Live sessions currently held, including expired ones not yet swept.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Swept expired tokens that have not been presented since.
    pub fn tombstone_count(&self) -> usize {
        self.expired.len()
    }

    /// Drop sessions that are expired or whose owner is gone.
    ///
    /// An expired session becomes a tombstone that `validate_session`
    /// reports as `SessionExpired` once. A live session whose owner is gone
    /// is dropped outright; validation would reject it the same way.
    /// Returns the number of sessions removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let users = self.users();
        let mut removed = 0;

        self.sessions.retain(|token, session| {
            if session.is_expired_at(now) {
                self.expired.insert(token.clone(), session.expires_at);
            } else if users.by_id.contains_key(&session.user_id) {
                return true;
            }
            removed += 1;
            false
        });
        drop(users);

        if removed > 0 {
            info!(
                removed = removed,
                remaining = self.sessions.len(),
                tombstones = self.expired.len(),
                "session sweep completed"
            );
        }
        removed
    }

    fn users(&self) -> RwLockReadGuard<'_, UserTable> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn users_mut(&self) -> RwLockWriteGuard<'_, UserTable> {
        self.users.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn test_warden() -> (Arc<ManualClock>, Warden) {
        let clock = Arc::new(ManualClock::starting_now());
        let config = WardenConfig::default().pbkdf2_iterations(1_000);
        let warden = Warden::with_clock(config, clock.clone()).unwrap();
        (clock, warden)
    }

    #[test]
    fn test_create_user_hashes_secret() {
        let (_clock, warden) = test_warden();
        let user = warden.create_user("alice", "secret123", "uploader").unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.role, "uploader");
        assert_ne!(user.password_hash, "secret123");
        assert!(PasswordHasher::verify("secret123", &user.password_hash));
        assert_eq!(warden.user(&user.id), Some(user));
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let (_clock, warden) = test_warden();
        warden.create_user("alice", "secret123", "uploader").unwrap();

        let result = warden.create_user("alice", "other", "admin");
        assert_eq!(result, Err(WardenError::UsernameTaken("alice".to_string())));
        assert_eq!(warden.user_count(), 1);
    }

    #[test]
    fn test_login_sets_ttl() {
        let (clock, warden) = test_warden();
        warden.create_user("alice", "secret123", "uploader").unwrap();

        let session = warden.login("alice", "secret123").unwrap();
        assert_eq!(session.created_at, clock.now());
        assert_eq!(session.expires_at, clock.now() + Duration::hours(24));
        assert_eq!(warden.session_count(), 1);
    }

    #[test]
    fn test_each_login_mints_new_token() {
        let (_clock, warden) = test_warden();
        warden.create_user("alice", "secret123", "uploader").unwrap();

        let first = warden.login("alice", "secret123").unwrap();
        let second = warden.login("alice", "secret123").unwrap();
        assert_ne!(first.token, second.token);
        assert_eq!(warden.session_count(), 2);
    }

    #[test]
    fn test_rejects_zero_cost_and_zero_ttl() {
        let zero_cost = WardenConfig::default().pbkdf2_iterations(0);
        assert!(matches!(Warden::new(zero_cost), Err(WardenError::InvalidConfig(_))));

        let zero_ttl = WardenConfig::default()
            .pbkdf2_iterations(1_000)
            .session_ttl(std::time::Duration::ZERO);
        assert!(matches!(Warden::new(zero_ttl), Err(WardenError::InvalidConfig(_))));
    }

    #[test]
    fn test_purge_expired_sweeps_only_dead_sessions() {
        let (clock, warden) = test_warden();
        let alice = warden.create_user("alice", "a", "uploader").unwrap();
        warden.create_user("bob", "b", "uploader").unwrap();

        let alice_session = warden.login("alice", "a").unwrap();
        clock.advance(Duration::hours(12));
        let bob_session = warden.login("bob", "b").unwrap();
        clock.advance(Duration::hours(13));

        // Alice's session is 25h old, Bob's 13h.
        assert_eq!(warden.purge_expired(), 1);
        assert_eq!(warden.session_count(), 1);
        assert_eq!(warden.tombstone_count(), 1);
        assert!(warden.validate_session(bob_session.token.as_str()).is_ok());

        // Sessions of deleted users go too, without a tombstone.
        let carol = warden.create_user("carol", "c", "viewer").unwrap();
        let carol_session = warden.login("carol", "c").unwrap();
        warden.delete_user(&carol.id).unwrap();
        assert_eq!(warden.purge_expired(), 1);
        assert_eq!(warden.tombstone_count(), 1);
        assert_eq!(
            warden.validate_session(carol_session.token.as_str()),
            Err(WardenError::InvalidCredentials)
        );

        assert!(warden.user(&alice.id).is_some());
        assert_eq!(
            warden.validate_session(alice_session.token.as_str()),
            Err(WardenError::SessionExpired)
        );
        assert_eq!(warden.tombstone_count(), 0);
    }

    #[test]
    fn test_logout_clears_tombstone() {
        let (clock, warden) = test_warden();
        warden.create_user("alice", "a", "uploader").unwrap();
        let session = warden.login("alice", "a").unwrap();
        clock.set(session.expires_at);
        warden.purge_expired();

        warden.logout(session.token.as_str());
        assert_eq!(warden.tombstone_count(), 0);
        assert_eq!(
            warden.validate_session(session.token.as_str()),
            Err(WardenError::InvalidCredentials)
        );
    }

    #[test]
    fn test_delete_user_frees_username() {
        let (_clock, warden) = test_warden();
        let user = warden.create_user("alice", "secret123", "uploader").unwrap();

        warden.delete_user(&user.id).unwrap();
        assert!(warden.find_user("alice").is_none());
        assert_eq!(
            warden.delete_user(&user.id),
            Err(WardenError::NotFound(user.id.to_string()))
        );

        let again = warden.create_user("alice", "new secret", "uploader").unwrap();
        assert_ne!(again.id, user.id);
    }
}
