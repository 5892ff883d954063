// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! TOTP (RFC 6238) secret generation, provisioning and verification.
//!
//! Codes are SHA1, 6 digits, 30 second steps. Verification accepts the
//! current step and one step either side.

use data_encoding::BASE32;
use rand::RngCore;
use std::time::{SystemTime, UNIX_EPOCH};
use totp_rs::{Algorithm, TOTP};

use crate::error::AppError;

const SECRET_BYTES: usize = 20;
const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP_SECS: u64 = 30;

/// TOTP engine bound to the issuer name shown in authenticator apps.
#[derive(Debug, Clone)]
pub struct TotpEngine {
    issuer: String,
}

impl TotpEngine {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    /// 20 random bytes, base32 encoded (32 characters).
    pub fn generate_secret() -> String {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        BASE32.encode(&bytes)
    }

    /// `otpauth://` URI for enrolling `email` with `secret`.
    pub fn provisioning_uri(&self, email: &str, secret: &str) -> Result<String, AppError> {
        Ok(self.build(email, secret)?.get_url())
    }

    /// PNG QR code of the provisioning URI as a `data:` URI.
    pub fn render_qr(&self, email: &str, secret: &str) -> Result<String, AppError> {
        let qr_base64 = self.build(email, secret)?.get_qr_base64().map_err(|e| {
            tracing::error!(error = %e, "QR code generation failed");
            AppError::Internal(anyhow::anyhow!("qr code generation error"))
        })?;

        Ok(format!("data:image/png;base64,{}", qr_base64))
    }

    /// Check `code` against `secret` at the current time.
    pub fn verify(&self, code: &str, secret: &str) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.verify_at(code, secret, now)
    }

    /// Check `code` against `secret` at `unix_secs`.
    ///
    /// Malformed codes and undecodable secrets are rejected, never errors.
    pub fn verify_at(&self, code: &str, secret: &str, unix_secs: u64) -> bool {
        if code.len() != DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }

        match self.build("", secret) {
            Ok(totp) => totp.check(code, unix_secs),
            Err(_) => false,
        }
    }

    fn build(&self, email: &str, secret: &str) -> Result<TOTP, AppError> {
        let secret_bytes = BASE32.decode(secret.as_bytes()).map_err(|e| {
            tracing::warn!(error = ?e, "TOTP secret is not valid base32");
            AppError::Internal(anyhow::anyhow!("invalid base32 secret"))
        })?;

        let issuer = if email.is_empty() {
            None
        } else {
            Some(self.issuer.clone())
        };

        TOTP::new(
            Algorithm::SHA1,
            DIGITS,
            SKEW,
            STEP_SECS,
            secret_bytes,
            issuer,
            email.to_string(),
        )
        .map_err(|e| {
            tracing::error!(error = %e, "TOTP construction failed");
            AppError::Internal(anyhow::anyhow!("totp creation error"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";
    const NOW: u64 = 1_767_225_615;

    fn code_at(secret: &str, unix_secs: u64) -> String {
        let bytes = BASE32.decode(secret.as_bytes()).unwrap();
        TOTP::new(Algorithm::SHA1, 6, 1, 30, bytes, None, String::new())
            .unwrap()
            .generate(unix_secs)
    }

    #[test]
    fn test_generate_secret() {
        let secret = TotpEngine::generate_secret();
        assert_eq!(secret.len(), 32);
        assert!(secret
            .chars()
            .all(|c| "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567".contains(c)));
        assert_ne!(secret, TotpEngine::generate_secret());
    }

    #[test]
    fn test_provisioning_uri() {
        let engine = TotpEngine::new("Admin Console");
        let uri = engine.provisioning_uri("dev@dev.com", SECRET).unwrap();

        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains(&format!("secret={}", SECRET)));
        assert!(uri.contains("issuer=Admin%20Console"));
        assert!(uri.contains("dev%40dev.com") || uri.contains("dev@dev.com"));
    }

    #[test]
    fn test_render_qr_is_png_data_uri() {
        let engine = TotpEngine::new("Admin Console");
        let qr = engine.render_qr("dev@dev.com", SECRET).unwrap();
        assert!(qr.starts_with("data:image/png;base64,"));
        assert!(qr.len() > "data:image/png;base64,".len());
    }

    #[test]
    fn test_verify_window() {
        let engine = TotpEngine::new("Admin Console");

        assert!(engine.verify_at(&code_at(SECRET, NOW), SECRET, NOW));
        assert!(engine.verify_at(&code_at(SECRET, NOW - 30), SECRET, NOW));
        assert!(engine.verify_at(&code_at(SECRET, NOW + 30), SECRET, NOW));

        assert!(!engine.verify_at(&code_at(SECRET, NOW - 60), SECRET, NOW));
        assert!(!engine.verify_at(&code_at(SECRET, NOW + 60), SECRET, NOW));
    }

    #[test]
    fn test_verify_rejects_malformed_codes() {
        let engine = TotpEngine::new("Admin Console");
        assert!(!engine.verify_at("12345", SECRET, NOW));
        assert!(!engine.verify_at("1234567", SECRET, NOW));
        assert!(!engine.verify_at("12345a", SECRET, NOW));
        assert!(!engine.verify_at("", SECRET, NOW));
        assert!(!engine.verify_at(" 12345", SECRET, NOW));
    }

    #[test]
    fn test_verify_rejects_bad_secret() {
        let engine = TotpEngine::new("Admin Console");
        assert!(!engine.verify_at("123456", "not base32!", NOW));
    }

    #[test]
    fn test_verify_uses_clock() {
        let engine = TotpEngine::new("Admin Console");
        let secret = TotpEngine::generate_secret();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        assert!(engine.verify(&code_at(&secret, now), &secret));
    }
}
