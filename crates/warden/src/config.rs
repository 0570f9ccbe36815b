//! Credential and session settings.

use std::time::Duration;

use crate::password::DEFAULT_PBKDF2_ITERATIONS;

/// Default session lifetime: 24 hours.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct WardenConfig {
    /// How long a session stays valid after login.
    pub session_ttl: Duration,

    /// PBKDF2 iteration count for new password hashes. Existing hashes keep
    /// the count they were created with.
    pub pbkdf2_iterations: u32,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            session_ttl: DEFAULT_SESSION_TTL,
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

impl WardenConfig {
    /// Builder: set the session lifetime.
    pub fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Builder: set the PBKDF2 cost.
    pub fn pbkdf2_iterations(mut self, iterations: u32) -> Self {
        self.pbkdf2_iterations = iterations;
        self
    }
}
