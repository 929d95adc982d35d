//! Session token issuing and verification
//!
//! Tokens are HS256 JWTs carrying the subject (user id and email) and an
//! expiry. They are
//! self-verifying: a token is only accepted if its signature checks out
//! against a known key and its `exp` has not passed, whatever the session
//! store says about it.
//!
//! Security notes:
//! - Default lifetime is 10 minutes
//! - Expiry is checked with zero leeway so the token and its session record
//!   lapse together
//! - The header `kid` selects the verification key (see [`SigningKeys`])

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::auth::keys::{SigningKey, SigningKeys};
use crate::types::{AuthError, Result};

/// Default token lifetime
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(10 * 60);

/// Payload stored in the JWT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id
    pub sub: Uuid,
    /// Subject email
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Unique token id; two tokens issued in the same second still differ
    pub jti: String,
}

impl Claims {
    /// Expiry as an absolute instant
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp as i64, 0).unwrap_or_default()
    }
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

impl IssuedToken {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.claims.expires_at()
    }

    /// Time left until expiry, zero if already past
    pub fn remaining(&self) -> Duration {
        (self.expires_at() - Utc::now()).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whole seconds left until expiry, rounded up for the cookie `Max-Age`
    pub fn max_age_secs(&self) -> u64 {
        let remaining = self.remaining();
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }
}

/// JWT issuer and verifier
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<SigningKeys>,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(keys: Arc<SigningKeys>, ttl: Duration) -> Self {
        Self { keys, ttl }
    }

    /// Issuer for dev mode with the fixed dev key
    pub fn new_dev() -> Self {
        Self::new(Arc::new(SigningKeys::dev()), DEFAULT_TOKEN_TTL)
    }

    /// Token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for a verified identity
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<IssuedToken> {
        let now = u64::try_from(Utc::now().timestamp())
            .map_err(|e| AuthError::Signing(format!("System time error: {}", e)))?;

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs(),
            jti: Uuid::new_v4().to_string(),
        };

        let key = self.keys.current();
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(key.kid().to_string());

        let token = encode(&header, &claims, &EncodingKey::from_secret(key.secret()))
            .map_err(|e| AuthError::Signing(format!("Failed to sign token: {}", e)))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let header = decode_header(token)
            .map_err(|_| AuthError::Unauthorized("invalid token".into()))?;

        let candidates: Vec<&SigningKey> = match header.kid.as_deref() {
            Some(kid) => self.keys.find(kid).into_iter().collect(),
            None => self.keys.verification_keys().collect(),
        };

        if candidates.is_empty() {
            debug!(kid = ?header.kid, "Token signed with unknown key id");
            return Err(AuthError::Unauthorized("invalid token".into()));
        }

        for key in candidates {
            match decode::<Claims>(token, &DecodingKey::from_secret(key.secret()), &validation()) {
                Ok(data) => return Ok(data.claims),
                // Expiry is only checked once the signature matched
                Err(err) if matches!(err.kind(), ErrorKind::ExpiredSignature) => {
                    return Err(AuthError::Unauthorized("token expired".into()));
                }
                Err(_) => continue,
            }
        }

        Err(AuthError::Unauthorized("invalid token".into()))
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp"]);
    validation
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET_A: &str = "test-secret-that-is-at-least-32-characters-long";
    const SECRET_B: &str = "different-secret-that-is-at-least-32-characters";

    fn issuer_with(kid: &str, secret: &str, retired: Option<&str>) -> TokenIssuer {
        let keys = SigningKeys::from_config(kid, secret, retired).unwrap();
        TokenIssuer::new(Arc::new(keys), DEFAULT_TOKEN_TTL)
    }

    fn sign_raw(claims: &Claims, kid: &str, secret: &str) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(kid.into());
        encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer_with("k1", SECRET_A, None);
        let issued = issuer.issue(Uuid::nil(), "a@b.com").unwrap();

        assert_eq!(issued.claims.exp - issued.claims.iat, 600);
        let remaining = issued.remaining().as_secs();
        assert!((598..=600).contains(&remaining));

        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims, issued.claims);
    }

    #[test]
    fn test_subject_carried_in_token() {
        let issuer = issuer_with("k1", SECRET_A, None);
        let user_id = Uuid::new_v4();
        let issued = issuer.issue(user_id, "a@b.com").unwrap();

        assert_eq!(issuer.verify(&issued.token).unwrap().sub, user_id);
    }

    #[test]
    fn test_max_age_rounds_up() {
        let issuer = TokenIssuer::new(
            Arc::new(SigningKeys::from_config("k1", SECRET_A, None).unwrap()),
            Duration::from_secs(2),
        );
        let issued = issuer.issue(Uuid::nil(), "a@b.com").unwrap();

        let max_age = issued.max_age_secs();
        assert!((1..=2).contains(&max_age), "max_age = {}", max_age);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer_a = issuer_with("k1", SECRET_A, None);
        let issuer_b = issuer_with("k1", SECRET_B, None);

        let issued = issuer_a.issue(Uuid::nil(), "a@b.com").unwrap();
        assert!(matches!(
            issuer_b.verify(&issued.token),
            Err(AuthError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let issuer = issuer_with("k1", SECRET_A, None);
        let issued = issuer.issue(Uuid::nil(), "a@b.com").unwrap();

        let sig_start = issued.token.rfind('.').unwrap() + 1;
        let mut bytes = issued.token.clone().into_bytes();
        bytes[sig_start + 5] = if bytes[sig_start + 5] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert!(issuer.verify(&tampered).is_err());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let issuer = issuer_with("k1", SECRET_A, None);
        let issued = issuer.issue(Uuid::nil(), "a@b.com").unwrap();
        let other = issuer.issue(Uuid::nil(), "evil@b.com").unwrap();

        // Splice the other token's payload under the first token's signature
        let parts: Vec<&str> = issued.token.split('.').collect();
        let other_parts: Vec<&str> = other.token.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(issuer.verify(&spliced).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer_with("k1", SECRET_A, None);
        let now = Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: Uuid::nil(),
            email: "a@b.com".into(),
            iat: now - 700,
            exp: now - 100,
            jti: "expired".into(),
        };
        let token = sign_raw(&claims, "k1", SECRET_A);

        match issuer.verify(&token) {
            Err(AuthError::Unauthorized(msg)) => assert_eq!(msg, "token expired"),
            other => panic!("expected expiry rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_retired_key_still_verifies() {
        let old_issuer = issuer_with("old", SECRET_B, None);
        let issued = old_issuer.issue(Uuid::nil(), "a@b.com").unwrap();

        let retired = format!("old:{}", SECRET_B);
        let rotated = issuer_with("new", SECRET_A, Some(&retired));
        assert!(rotated.verify(&issued.token).is_ok());

        // New tokens are signed with the new key
        let fresh = rotated.issue(Uuid::nil(), "a@b.com").unwrap();
        let header = decode_header(&fresh.token).unwrap();
        assert_eq!(header.kid.as_deref(), Some("new"));
        assert!(old_issuer.verify(&fresh.token).is_err());
    }

    #[test]
    fn test_unknown_kid_rejected() {
        let issuer = issuer_with("k1", SECRET_A, None);
        let now = Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: Uuid::nil(),
            email: "a@b.com".into(),
            iat: now,
            exp: now + 600,
            jti: "ghost".into(),
        };
        let token = sign_raw(&claims, "ghost", SECRET_A);
        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let issuer = TokenIssuer::new_dev();
        assert!(issuer.verify("invalid-token").is_err());
        assert!(issuer.verify("").is_err());
    }
}
