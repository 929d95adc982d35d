//! Authentication for sessiongate
//!
//! Provides:
//! - Credential shape validation and verification against stored users
//! - Password hashing with Argon2
//! - JWT issuing/verification with a rotatable signing-key set
//! - Session cookie handling
//! - The request gate (guard pipeline + session guard)

pub mod cookie;
pub mod credentials;
pub mod gate;
pub mod jwt;
pub mod keys;
pub mod password;
pub mod validation;

pub use cookie::{extract_session_id, CookieWriter, SESSION_COOKIE};
pub use credentials::CredentialVerifier;
pub use gate::{AuthGate, AuthenticatedUser, Guard, GuardOutcome, GuardPipeline, RequestContext};
pub use jwt::{Claims, IssuedToken, TokenIssuer, DEFAULT_TOKEN_TTL};
pub use keys::{SigningKey, SigningKeys};
pub use password::{hash_password, verify_password};
pub use validation::{validate_credentials, MIN_PASSWORD_LEN};
