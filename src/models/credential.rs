//! Two-factor credential model for storage and API.

use crate::time_utils::parse_utc_rfc3339;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// TOTP credential stored in Firestore, keyed by lower-cased email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Base32 TOTP secret; replaced only while the record is pending
    pub secret: String,
    /// Set on the first successful verification
    pub enabled: bool,
    /// When the record was created (RFC3339)
    pub created_at: String,
    /// Last successful verification (RFC3339)
    #[serde(default)]
    pub last_used: Option<String>,
    /// Verification counts as current until this instant (RFC3339)
    #[serde(default)]
    pub verified_until: Option<String>,
    /// Session id of the verify not yet turned into a marker cookie
    #[serde(default)]
    pub confirm_session: Option<String>,
    /// `confirm_session` is usable until this instant (RFC3339)
    #[serde(default)]
    pub confirm_until: Option<String>,
}

impl CredentialRecord {
    /// Fresh, not yet enabled record.
    pub fn new(secret: String, created_at: String) -> Self {
        Self {
            secret,
            enabled: false,
            created_at,
            last_used: None,
            verified_until: None,
            confirm_session: None,
            confirm_until: None,
        }
    }

    /// Whether the record has been verified recently enough to still count.
    pub fn is_verified_at(&self, now: DateTime<Utc>) -> bool {
        self.enabled
            && self
                .verified_until
                .as_deref()
                .and_then(parse_utc_rfc3339)
                .is_some_and(|until| until > now)
    }

    /// Whether `session_id` holds an unconsumed, unexpired confirmation.
    pub fn can_confirm_at(&self, session_id: &str, now: DateTime<Utc>) -> bool {
        !session_id.is_empty()
            && self.confirm_session.as_deref() == Some(session_id)
            && self
                .confirm_until
                .as_deref()
                .and_then(parse_utc_rfc3339)
                .is_some_and(|until| until > now)
    }

    /// Drop any open confirmation.
    pub fn clear_confirmation(&mut self) {
        self.confirm_session = None;
        self.confirm_until = None;
    }
}
