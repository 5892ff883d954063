// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin session tokens.
//!
//! A session is a stateless HS256 JWT; validity is signature plus expiry.
//! Only allow-listed emails are ever minted a token, and every minted token
//! carries `admin: true`.

use crate::config::Config;
use crate::error::AppError;
use crate::services::identity::{IdentityError, IdentityVerifier};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use data_encoding::HEXLOWER;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// JWT claims carried by the session cookie.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (identity provider user id)
    pub sub: String,
    pub email: String,
    /// Administrative privilege; absent reads as false
    #[serde(default)]
    pub admin: bool,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Random per-session id; binds a 2FA verification to this session
    #[serde(default)]
    pub sid: String,
}

/// Mints and validates admin session tokens.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    allow_list: HashSet<String>,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(signing_key: &[u8], allow_list: HashSet<String>, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
            allow_list: allow_list
                .into_iter()
                .map(|email| email.to_lowercase())
                .collect(),
            ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_signing_key,
            config.admin_emails.clone(),
            config.session_ttl,
        )
    }

    pub fn is_allowed(&self, email: &str) -> bool {
        self.allow_list.contains(&email.to_lowercase())
    }

    /// Exchange an identity token for a session token.
    pub async fn issue(
        &self,
        verifier: &IdentityVerifier,
        id_token: &str,
    ) -> Result<String, AppError> {
        let identity = verifier
            .verify_id_token(id_token)
            .await
            .map_err(|err| match err {
                IdentityError::Invalid(reason) => {
                    tracing::warn!(reason = %reason, "Rejected identity token");
                    AppError::InvalidToken
                }
                IdentityError::Transient(reason) => {
                    AppError::Internal(anyhow::anyhow!("identity verification failed: {reason}"))
                }
            })?;

        self.mint(&identity.subject, &identity.email)
    }

    /// Mint a session token for an already verified identity.
    pub fn mint(&self, subject: &str, email: &str) -> Result<String, AppError> {
        let email = email.trim().to_lowercase();
        if !self.is_allowed(&email) {
            tracing::warn!(email = %email, "Session refused: email not on admin allow-list");
            return Err(AppError::Forbidden(format!("{email} is not an administrator")));
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
            .as_secs() as usize;

        let claims = SessionClaims {
            sub: subject.to_string(),
            email: email.clone(),
            admin: true,
            iat: now,
            exp: now + self.ttl.as_secs() as usize,
            sid: new_session_id(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

        tracing::info!(email = %email, "Admin session issued");
        Ok(token)
    }

    /// Decode a session token; bad signatures and expired tokens yield `None`.
    pub fn decode(&self, token: &str) -> Option<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .ok()
    }
}

fn new_session_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    HEXLOWER.encode(&bytes)
}
