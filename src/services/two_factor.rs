// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Two-factor enrollment and verification over the credential store.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::CredentialRecord;
use crate::services::attempts::AttemptLimiter;
use crate::services::totp::TotpEngine;
use crate::time_utils::format_utc_rfc3339;
use chrono::Utc;
use std::time::Duration;

/// Enrollment state for one email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TwoFactorStatus {
    pub enabled: bool,
    pub verified: bool,
}

/// Result of a setup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Scan this to enroll.
    Provisioned { qr: String, otpauth: String },
    AlreadyEnabled,
}

/// Business logic for `/api/2fa/*`.
#[derive(Clone)]
pub struct TwoFactorService {
    db: FirestoreDb,
    totp: TotpEngine,
    limiter: AttemptLimiter,
    verified_ttl: Duration,
}

impl TwoFactorService {
    pub fn new(
        db: FirestoreDb,
        totp: TotpEngine,
        limiter: AttemptLimiter,
        verified_ttl: Duration,
    ) -> Self {
        Self {
            db,
            totp,
            limiter,
            verified_ttl,
        }
    }

    pub async fn status(&self, email: &str) -> Result<TwoFactorStatus, AppError> {
        let email = normalize_email(email);
        let Some(record) = self.db.get_credential(&email).await? else {
            return Ok(TwoFactorStatus::default());
        };

        Ok(TwoFactorStatus {
            enabled: record.enabled,
            verified: record.is_verified_at(Utc::now()),
        })
    }

    /// Provision a TOTP secret for `email`, or report that one is active.
    ///
    /// Each call on a pending (not yet enabled) record issues a fresh secret,
    /// so only the latest caller's QR can ever enable the account. Concurrent
    /// first setups race on create-if-absent and the loser adopts the
    /// winner's secret.
    pub async fn setup(&self, email: &str) -> Result<SetupOutcome, AppError> {
        let email = normalize_email(email);

        let secret = match self.db.get_credential(&email).await? {
            Some(record) if record.enabled => None,
            Some(_) => self.replace_pending_secret(&email).await?,
            None => Some(self.create_record(&email).await?),
        };

        let Some(secret) = secret else {
            tracing::info!(email = %email, "2FA already enabled");
            return Ok(SetupOutcome::AlreadyEnabled);
        };

        let otpauth = self.totp.provisioning_uri(&email, &secret)?;
        let qr = self.totp.render_qr(&email, &secret)?;

        tracing::info!(email = %email, "2FA setup provisioned");
        Ok(SetupOutcome::Provisioned { qr, otpauth })
    }

    async fn create_record(&self, email: &str) -> Result<String, AppError> {
        let record = CredentialRecord::new(
            TotpEngine::generate_secret(),
            format_utc_rfc3339(Utc::now()),
        );

        if self.db.create_credential_if_absent(email, &record).await? {
            return Ok(record.secret);
        }

        // Lost the race; adopt the winner's secret.
        let winner = self.db.get_credential(email).await?.ok_or_else(|| {
            AppError::Database(format!("credential for {email} vanished after conflict"))
        })?;
        Ok(winner.secret)
    }

    /// `None` if the record was enabled in the meantime.
    async fn replace_pending_secret(&self, email: &str) -> Result<Option<String>, AppError> {
        let fresh = TotpEngine::generate_secret();

        self.db
            .update_credential(email, |record| {
                if record.enabled {
                    return Ok(None);
                }
                record.secret = fresh;
                record.last_used = None;
                record.verified_until = None;
                record.clear_confirmation();
                Ok(Some(record.secret.clone()))
            })
            .await
    }

    /// Check a code; the first success enables 2FA for the email.
    ///
    /// `session_id` is the id of the caller's admin session for this same
    /// email, if any. A success made with one opens a confirmation that only
    /// that session can turn into a marker cookie.
    pub async fn verify(
        &self,
        email: &str,
        code: &str,
        session_id: Option<&str>,
    ) -> Result<(), AppError> {
        let email = normalize_email(email);

        // Counted before the store read; forgiven below when no code was judged.
        if let Err(remaining) = self.limiter.reserve(&email) {
            tracing::warn!(email = %email, "2FA verify throttled");
            return Err(AppError::RateLimited {
                retry_after_secs: remaining.as_secs().max(1),
            });
        }

        let result = self
            .check_and_record(&email, code.trim(), session_id)
            .await;
        match &result {
            Ok(newly_enabled) => {
                self.limiter.reset(&email);
                if *newly_enabled {
                    tracing::info!(email = %email, "2FA enabled");
                }
                tracing::info!(email = %email, "2FA code verified");
            }
            Err(AppError::IncorrectCode) => {
                tracing::warn!(email = %email, "2FA code rejected");
            }
            Err(_) => self.limiter.release(&email),
        }

        result.map(|_| ())
    }

    /// Returns whether this verification enabled the record.
    async fn check_and_record(
        &self,
        email: &str,
        code: &str,
        session_id: Option<&str>,
    ) -> Result<bool, AppError> {
        let now = Utc::now();
        let verified_until = now + to_chrono(self.verified_ttl)?;
        let confirm_until = now + to_chrono(CONFIRM_WINDOW)?;

        self.db
            .update_credential(email, |record| {
                if !self.totp.verify(code, &record.secret) {
                    return Err(AppError::IncorrectCode);
                }

                let newly_enabled = !record.enabled;
                record.enabled = true;
                record.last_used = Some(format_utc_rfc3339(now));
                record.verified_until = Some(format_utc_rfc3339(verified_until));
                match session_id.filter(|sid| !sid.is_empty()) {
                    Some(sid) => {
                        record.confirm_session = Some(sid.to_string());
                        record.confirm_until = Some(format_utc_rfc3339(confirm_until));
                    }
                    None => record.clear_confirmation(),
                }
                Ok(newly_enabled)
            })
            .await
    }

    /// Consume the confirmation a verify opened for `session_id`.
    ///
    /// Succeeds once per successful verify, within `CONFIRM_WINDOW`, and only
    /// for the session that presented the code.
    pub async fn confirm(&self, email: &str, session_id: &str) -> Result<(), AppError> {
        let email = normalize_email(email);
        let now = Utc::now();

        let result = self
            .db
            .update_credential(&email, |record| {
                if !record.is_verified_at(now) || !record.can_confirm_at(session_id, now) {
                    return Err(AppError::Forbidden(
                        "2FA verification required for this session".to_string(),
                    ));
                }
                record.clear_confirmation();
                Ok(())
            })
            .await;

        match result {
            Err(AppError::NotConfigured) => Err(AppError::Forbidden(
                "2FA verification required for this session".to_string(),
            )),
            other => other,
        }
    }
}

/// How long a successful verify may be turned into a marker cookie.
pub const CONFIRM_WINDOW: Duration = Duration::from_secs(5 * 60);

fn to_chrono(duration: Duration) -> Result<chrono::Duration, AppError> {
    chrono::Duration::from_std(duration)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("duration out of range: {e}")))
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
