//! Session cookie reading and writing
//!
//! The session id travels in a single `session_id` cookie:
//! `HttpOnly`, `Path=/`, `Max-Age` equal to the seconds left on the token.
//! `Secure` is opt-in (`COOKIE_SECURE`), since TLS is terminated elsewhere.

use hyper::header::{HeaderMap, HeaderValue, COOKIE};

use crate::types::{AuthError, Result};

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "session_id";

/// Read a cookie value from the request headers.
///
/// Looks through every `Cookie` header; empty values count as absent.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Read the session id cookie
pub fn extract_session_id(headers: &HeaderMap) -> Option<String> {
    extract_cookie(headers, SESSION_COOKIE)
}

/// Builds `Set-Cookie` values for the session cookie
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieWriter {
    pub secure: bool,
}

impl CookieWriter {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    /// Cookie establishing a session for `max_age_secs`
    pub fn session(&self, session_id: &str, max_age_secs: u64) -> Result<HeaderValue> {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly",
            SESSION_COOKIE, session_id, max_age_secs
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        to_header(cookie)
    }

    /// Cookie that tells the browser to drop the session immediately.
    ///
    /// `Max-Age=0` plus an `Expires` in the past covers clients that only
    /// honour one of the two.
    pub fn clear(&self) -> Result<HeaderValue> {
        let mut cookie = format!(
            "{}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly",
            SESSION_COOKIE
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        to_header(cookie)
    }
}

fn to_header(cookie: String) -> Result<HeaderValue> {
    HeaderValue::from_str(&cookie)
        .map_err(|e| AuthError::Internal(format!("Invalid cookie header: {}", e)))
}
