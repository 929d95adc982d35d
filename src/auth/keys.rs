//! Signing-key provider for session tokens
//!
//! Tokens are signed with exactly one current key. Verification accepts the
//! current key plus any number of retired keys, so a secret can be rotated
//! without signing every live session out. Each key has an id that is written
//! into the token header (`kid`).
//!
//! Key material is zeroized when dropped.

use std::fmt;
use zeroize::Zeroize;

use crate::types::{AuthError, Result};

/// Minimum secret length outside dev mode (HS256 wants >= 256 bits)
pub const MIN_SECRET_LEN: usize = 32;

/// Key id used when none is configured
pub const DEFAULT_KEY_ID: &str = "primary";

const DEV_SECRET: &str = "dev-mode-secret-not-for-production-use-123456";

/// A single HMAC secret and its key id
pub struct SigningKey {
    kid: String,
    secret: Vec<u8>,
}

impl SigningKey {
    pub fn new(kid: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            kid: kid.into(),
            secret: secret.into(),
        }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

/// Current signing key plus the keys still accepted for verification
#[derive(Debug)]
pub struct SigningKeys {
    current: SigningKey,
    retired: Vec<SigningKey>,
}

impl SigningKeys {
    /// Build a key set, enforcing secret length and unique key ids
    pub fn new(current: SigningKey, retired: Vec<SigningKey>) -> Result<Self> {
        for key in std::iter::once(&current).chain(retired.iter()) {
            if key.secret.is_empty() {
                return Err(AuthError::Config(format!(
                    "signing key '{}' has an empty secret",
                    key.kid
                )));
            }
            if key.secret.len() < MIN_SECRET_LEN {
                return Err(AuthError::Config(format!(
                    "signing key '{}' must be at least {} bytes",
                    key.kid, MIN_SECRET_LEN
                )));
            }
        }

        let mut seen = vec![current.kid.as_str()];
        for key in &retired {
            if seen.contains(&key.kid.as_str()) {
                return Err(AuthError::Config(format!(
                    "duplicate signing key id '{}'",
                    key.kid
                )));
            }
            seen.push(key.kid.as_str());
        }

        Ok(Self { current, retired })
    }

    /// Fixed, well-known key for dev mode
    pub fn dev() -> Self {
        Self {
            current: SigningKey::new("dev", DEV_SECRET),
            retired: Vec::new(),
        }
    }

    /// Build from configuration values.
    ///
    /// `retired` is a comma separated list of `kid:secret` pairs.
    pub fn from_config(kid: &str, secret: &str, retired: Option<&str>) -> Result<Self> {
        let current = SigningKey::new(kid, secret.as_bytes());
        let retired = match retired {
            Some(list) => parse_retired(list)?,
            None => Vec::new(),
        };
        Self::new(current, retired)
    }

    /// Key used for signing new tokens
    pub fn current(&self) -> &SigningKey {
        &self.current
    }

    /// Look up a verification key by id
    pub fn find(&self, kid: &str) -> Option<&SigningKey> {
        self.verification_keys().find(|key| key.kid == kid)
    }

    /// All keys a token may be signed with, current first
    pub fn verification_keys(&self) -> impl Iterator<Item = &SigningKey> {
        std::iter::once(&self.current).chain(self.retired.iter())
    }
}

fn parse_retired(list: &str) -> Result<Vec<SigningKey>> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((kid, secret)) if !kid.is_empty() => Ok(SigningKey::new(kid, secret.as_bytes())),
            _ => Err(AuthError::Config(
                "retired signing keys must be written as kid:secret".into(),
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET_A: &str = "test-secret-that-is-at-least-32-characters-long";
    const SECRET_B: &str = "another-secret-that-is-at-least-32-characters";

    #[test]
    fn test_secret_length_enforced() {
        assert!(SigningKeys::from_config("k1", "short", None).is_err());
        assert!(SigningKeys::from_config("k1", "", None).is_err());
        assert!(SigningKeys::from_config("k1", SECRET_A, None).is_ok());
    }

    #[test]
    fn test_retired_keys_parsed() {
        let retired = format!("old:{}", SECRET_B);
        let keys = SigningKeys::from_config("new", SECRET_A, Some(&retired)).unwrap();

        assert_eq!(keys.current().kid(), "new");
        assert_eq!(keys.verification_keys().count(), 2);
        assert_eq!(keys.find("old").unwrap().secret(), SECRET_B.as_bytes());
        assert!(keys.find("missing").is_none());
    }

    #[test]
    fn test_malformed_retired_list() {
        assert!(SigningKeys::from_config("new", SECRET_A, Some("no-separator")).is_err());
        assert!(SigningKeys::from_config("new", SECRET_A, Some(&format!(":{}", SECRET_B))).is_err());
    }

    #[test]
    fn test_duplicate_kid_rejected() {
        let retired = format!("same:{}", SECRET_B);
        assert!(SigningKeys::from_config("same", SECRET_A, Some(&retired)).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let key = SigningKey::new("k", SECRET_A);
        let printed = format!("{:?}", key);
        assert!(!printed.contains(SECRET_A));
        assert!(printed.contains("redacted"));
    }
}
