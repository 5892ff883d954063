// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are injected as environment variables by the hosting platform and
//! read once at startup.

use std::collections::HashSet;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_SESSION_TTL_DAYS: u64 = 7;

/// Which backend holds the two-factor credential records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialBackend {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL; an https URL turns on `Secure` cookies
    pub frontend_url: String,
    /// Firebase project that issues identity tokens (also the Firestore project)
    pub firebase_project_id: String,
    /// Server port
    pub port: u16,
    /// Issuer shown in authenticator apps
    pub totp_issuer: String,
    /// Lifetime shared by the session JWT, the session cookie and the 2FA marker
    pub session_ttl: Duration,
    /// Lower-cased emails allowed to receive admin sessions
    pub admin_emails: HashSet<String>,
    /// Redirect target for requests without a usable session
    pub login_path: String,
    /// Redirect target for sessions without the admin claim
    pub unauthorized_path: String,
    /// Redirect target for admin sessions that have not passed 2FA
    pub two_factor_path: String,
    /// Failed verify attempts allowed per email inside `verify_window`
    pub verify_max_attempts: u32,
    pub verify_window: Duration,
    pub credential_backend: CredentialBackend,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            firebase_project_id: "test-project".to_string(),
            port: 8080,
            totp_issuer: "Admin Console".to_string(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_DAYS * 24 * 60 * 60),
            admin_emails: parse_admin_emails("dev@dev.com"),
            login_path: "/login".to_string(),
            unauthorized_path: "/unauthorized".to_string(),
            two_factor_path: "/2fa".to_string(),
            verify_max_attempts: 5,
            verify_window: Duration::from_secs(300),
            credential_backend: CredentialBackend::Memory,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let firebase_project_id = env::var("FIREBASE_PROJECT_ID")
            .or_else(|_| env::var("GCP_PROJECT_ID"))
            .unwrap_or_else(|_| "local-dev".to_string());

        let session_ttl_days: u64 = parse_var("SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS)?;

        let credential_backend = match env::var("CREDENTIAL_STORE").as_deref() {
            Ok("memory") => CredentialBackend::Memory,
            Ok("firestore") | Err(_) => CredentialBackend::Firestore,
            Ok(_) => return Err(ConfigError::Invalid("CREDENTIAL_STORE")),
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            firebase_project_id,
            port: parse_var("PORT", 8080)?,
            totp_issuer: env::var("TOTP_ISSUER").unwrap_or_else(|_| "Admin Console".to_string()),
            session_ttl: Duration::from_secs(session_ttl_days * 24 * 60 * 60),
            admin_emails: parse_admin_emails(&env::var("ADMIN_EMAILS").unwrap_or_default()),
            login_path: env::var("LOGIN_PATH").unwrap_or_else(|_| "/login".to_string()),
            unauthorized_path: env::var("UNAUTHORIZED_PATH")
                .unwrap_or_else(|_| "/unauthorized".to_string()),
            two_factor_path: env::var("TWO_FACTOR_PATH").unwrap_or_else(|_| "/2fa".to_string()),
            verify_max_attempts: parse_var("VERIFY_MAX_ATTEMPTS", 5)?,
            verify_window: Duration::from_secs(parse_var("VERIFY_WINDOW_SECS", 300)?),
            credential_backend,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Split a comma separated email list, trimming and lower-casing entries.
pub fn parse_admin_emails(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .collect()
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
