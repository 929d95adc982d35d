//! Structural validation of submitted credentials
//!
//! Runs before any database access. Every rule is checked and every
//! violation reported, so a caller fixing their form sees all problems at once.

use regex::Regex;
use std::sync::OnceLock;

/// Minimum accepted password length (in characters)
pub const MIN_PASSWORD_LEN: usize = 6;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern is a valid regex")
    })
}

/// Check an email address, returning the violated rule if any
pub fn validate_email(email: &str) -> Option<String> {
    if email.is_empty() {
        return Some("empty email is not allowed".into());
    }
    if !email_pattern().is_match(email) {
        return Some("invalid email".into());
    }
    None
}

/// Check a password against the length policy
pub fn validate_password(password: &str) -> Option<String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Some(format!(
            "password must be minimum {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    None
}

/// Validate an email/password pair, collecting every violation.
///
/// An empty vector means the pair is structurally valid.
pub fn validate_credentials(email: &str, password: &str) -> Vec<String> {
    [validate_email(email), validate_password(password)]
        .into_iter()
        .flatten()
        .collect()
}
