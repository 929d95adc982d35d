//! Credential verification
//!
//! Shape check first (all violations reported), then email lookup, then an
//! Argon2 comparison against the stored hash. Read-only.

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::auth::password::verify_password;
use crate::auth::validation::validate_credentials;
use crate::db::{User, UserRepository};
use crate::types::{bounded, AuthError, Result};

pub struct CredentialVerifier {
    users: Arc<dyn UserRepository>,
    timeout: Duration,
}

impl CredentialVerifier {
    pub fn new(users: Arc<dyn UserRepository>, timeout: Duration) -> Self {
        Self { users, timeout }
    }

    /// Return the user owning these credentials.
    ///
    /// - `Validation` when the email or password is malformed
    /// - `NotFound` when no user has the email
    /// - `Unauthorized` when the password does not match
    pub async fn verify(&self, email: &str, password: &str) -> Result<User> {
        let violations = validate_credentials(email, password);
        if !violations.is_empty() {
            return Err(AuthError::Validation(violations));
        }

        let user = bounded(self.timeout, "user lookup", self.users.find_by_email(email)).await?;

        if !verify_password(password, &user.password_hash)? {
            warn!("Sign-in failed - invalid password for {}", email);
            return Err(AuthError::Unauthorized("unauthorized".into()));
        }

        Ok(user)
    }
}
