// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin-gate: session and two-factor boundary for the site's admin panel
//!
//! This crate exchanges identity-provider tokens for admin session cookies,
//! enrolls and verifies TOTP second factors, and gates `/admin` requests.

pub mod config;
pub mod cookies;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{AttemptLimiter, IdentityVerifier, SessionIssuer, TotpEngine, TwoFactorService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub identity_verifier: Arc<IdentityVerifier>,
    pub session_issuer: SessionIssuer,
    pub two_factor: TwoFactorService,
}

impl AppState {
    /// Wire the services that derive from configuration.
    pub fn new(config: Config, db: FirestoreDb, identity_verifier: Arc<IdentityVerifier>) -> Self {
        let session_issuer = SessionIssuer::from_config(&config);
        let two_factor = TwoFactorService::new(
            db.clone(),
            TotpEngine::new(config.totp_issuer.clone()),
            AttemptLimiter::new(config.verify_max_attempts, config.verify_window),
            config.session_ttl,
        );

        Self {
            config,
            db,
            identity_verifier,
            session_issuer,
            two_factor,
        }
    }
}
