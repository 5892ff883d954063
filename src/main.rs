// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin-Gate API Server
//!
//! Issues admin session cookies from identity-provider logins and enforces
//! TOTP second-factor verification in front of the site's admin panel.

use admin_gate::{
    config::{Config, CredentialBackend},
    db::FirestoreDb,
    services::IdentityVerifier,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        admins = config.admin_emails.len(),
        "Starting Admin-Gate API"
    );

    if config.admin_emails.is_empty() {
        tracing::warn!("ADMIN_EMAILS is empty; no one can sign in");
    }

    // Initialize credential store
    let db = match config.credential_backend {
        CredentialBackend::Firestore => FirestoreDb::new(&config.firebase_project_id)
            .await
            .expect("Failed to connect to Firestore"),
        CredentialBackend::Memory => {
            tracing::warn!("Using in-memory credential store; enrollments are lost on restart");
            FirestoreDb::new_in_memory()
        }
    };

    let identity_verifier =
        Arc::new(IdentityVerifier::new(&config).expect("Failed to initialize identity verifier"));

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, identity_verifier));

    // Build router
    let app = admin_gate::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("admin_gate=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
