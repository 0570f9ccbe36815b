//! Salted, slow, one-way secret hashing (PBKDF2-HMAC-SHA256).
//!
//! Encoded form: `pbkdf2-sha256$<iterations>$<salt-hex>$<key-hex>`. The
//! iteration count travels with the hash, so raising the cost only affects
//! new hashes.

use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{Result, WardenError};

/// Default PBKDF2 iterations
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Hashes secrets at a fixed cost.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_PBKDF2_ITERATIONS)
    }
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash `secret` under a fresh random salt.
    pub fn hash(&self, secret: &str) -> Result<String> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let key = derive(secret, &salt, self.iterations)?;
        Ok(format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            hex::encode(salt),
            hex::encode(key)
        ))
    }

    /// Check `secret` against an encoded hash.
    ///
    /// The final comparison is constant time. A malformed hash never matches.
    pub fn verify(secret: &str, encoded: &str) -> bool {
        let Some(parsed) = ParsedHash::parse(encoded) else {
            return false;
        };
        let Ok(key) = derive(secret, &parsed.salt, parsed.iterations) else {
            return false;
        };
        key[..].ct_eq(&parsed.key[..]).into()
    }
}

struct ParsedHash {
    iterations: u32,
    salt: Vec<u8>,
    key: Vec<u8>,
}

impl ParsedHash {
    fn parse(encoded: &str) -> Option<Self> {
        let mut parts = encoded.split('$');
        if parts.next()? != SCHEME {
            return None;
        }
        let iterations = parts.next()?.parse().ok().filter(|&n: &u32| n > 0)?;
        let salt = hex::decode(parts.next()?).ok()?;
        let key = hex::decode(parts.next()?).ok()?;
        if parts.next().is_some() || key.len() != KEY_LEN {
            return None;
        }
        Some(Self {
            iterations,
            salt,
            key,
        })
    }
}

fn derive(secret: &str, salt: &[u8], iterations: u32) -> Result<[u8; KEY_LEN]> {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::<Hmac<Sha256>>(secret.as_bytes(), salt, iterations, &mut key)
        .map_err(|e| WardenError::Hashing(e.to_string()))?;
    Ok(key)
}
