//! Configuration for sessiongate
//!
//! CLI arguments with environment variable fallbacks (clap). `main` loads a
//! local `.env` first; a missing file is logged and ignored.

use clap::Parser;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::auth::keys::{SigningKeys, DEFAULT_KEY_ID};
use crate::types::AuthError;

/// Shortest accepted token lifetime; the cookie `Max-Age` must stay positive
pub const MIN_TOKEN_TTL_SECS: u64 = 2;

/// sessiongate - session-based authentication gateway
#[derive(Parser, Clone)]
#[command(name = "sessiongate")]
#[command(about = "Session-based authentication gateway")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (fixed dev signing key, in-memory fallbacks)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI (users and sessions)
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "sessiongate")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Key id written into new tokens
    #[arg(long, env = "JWT_KEY_ID", default_value = DEFAULT_KEY_ID)]
    pub jwt_key_id: String,

    /// Retired keys still accepted for verification, as `kid:secret,...`
    #[arg(long, env = "JWT_PREVIOUS_SECRETS", hide_env_values = true)]
    pub jwt_previous_secrets: Option<String>,

    /// Token and session lifetime in seconds
    #[arg(long, env = "TOKEN_TTL_SECS", default_value = "600")]
    pub token_ttl_secs: u64,

    /// Mark the session cookie `Secure`
    #[arg(long, env = "COOKIE_SECURE", default_value = "false")]
    pub cookie_secure: bool,

    /// Upper bound for each database/session-store call, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "5000")]
    pub request_timeout_ms: u64,

    /// Sweep interval for the in-memory session store, in seconds
    #[arg(long, env = "SESSION_SWEEP_SECS", default_value = "60")]
    pub session_sweep_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_secs.max(1))
    }

    /// Build the signing-key set.
    ///
    /// Dev mode without a configured secret falls back to the fixed dev key.
    pub fn signing_keys(&self) -> Result<SigningKeys, AuthError> {
        match &self.jwt_secret {
            Some(secret) => SigningKeys::from_config(
                &self.jwt_key_id,
                secret,
                self.jwt_previous_secrets.as_deref(),
            ),
            None if self.dev_mode => Ok(SigningKeys::dev()),
            None => Err(AuthError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.token_ttl_secs < MIN_TOKEN_TTL_SECS {
            return Err(format!(
                "TOKEN_TTL_SECS must be at least {}",
                MIN_TOKEN_TTL_SECS
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }
}

fn redacted(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "<redacted>")
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("listen", &self.listen)
            .field("dev_mode", &self.dev_mode)
            .field("mongodb_uri", &self.mongodb_uri)
            .field("mongodb_db", &self.mongodb_db)
            .field("jwt_secret", &redacted(&self.jwt_secret))
            .field("jwt_key_id", &self.jwt_key_id)
            .field("jwt_previous_secrets", &redacted(&self.jwt_previous_secrets))
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("cookie_secure", &self.cookie_secure)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("session_sweep_secs", &self.session_sweep_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters-long";

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["sessiongate"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--jwt-secret", SECRET]);
        assert_eq!(args.token_ttl(), Duration::from_secs(600));
        assert_eq!(args.jwt_key_id, "primary");
        assert!(!args.cookie_secure);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_production_requires_secret() {
        let args = Args {
            jwt_secret: None,
            ..parse(&["--jwt-secret", SECRET])
        };
        assert!(args.validate().is_err());
        assert!(args.signing_keys().is_err());
    }

    #[test]
    fn test_dev_mode_falls_back_to_dev_key() {
        let args = Args {
            jwt_secret: None,
            dev_mode: true,
            ..parse(&["--jwt-secret", SECRET])
        };
        assert!(args.validate().is_ok());
        assert_eq!(args.signing_keys().unwrap().current().kid(), "dev");
    }

    #[test]
    fn test_short_ttl_rejected() {
        for ttl in ["0", "1"] {
            let args = parse(&["--jwt-secret", SECRET, "--token-ttl-secs", ttl]);
            assert!(args.validate().is_err());
        }
        let args = parse(&["--jwt-secret", SECRET, "--token-ttl-secs", "2"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let previous = format!("old:{}", "retired-secret-that-is-32-characters-long");
        let args = parse(&["--jwt-secret", SECRET, "--jwt-previous-secrets", &previous]);

        let printed = format!("{:?}", args);
        assert!(!printed.contains(SECRET));
        assert!(!printed.contains("retired-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_rotation_keys_loaded() {
        let previous = format!("old:{}", "retired-secret-that-is-32-characters-long");
        let args = parse(&[
            "--jwt-secret",
            SECRET,
            "--jwt-key-id",
            "k2",
            "--jwt-previous-secrets",
            &previous,
        ]);
        let keys = args.signing_keys().unwrap();
        assert_eq!(keys.current().kid(), "k2");
        assert!(keys.find("old").is_some());
    }
}
