// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod attempts;
pub mod identity;
pub mod session;
pub mod totp;
pub mod two_factor;

pub use attempts::AttemptLimiter;
pub use identity::{IdentityError, IdentityVerifier, VerifiedIdentity};
pub use session::{SessionClaims, SessionIssuer};
pub use totp::TotpEngine;
pub use two_factor::{normalize_email, SetupOutcome, TwoFactorService, TwoFactorStatus};
