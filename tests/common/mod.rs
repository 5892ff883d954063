// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use admin_gate::config::Config;
use admin_gate::db::FirestoreDb;
use admin_gate::routes::create_router;
use admin_gate::services::IdentityVerifier;
use admin_gate::AppState;
use axum::http::{header, Response};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const ID_TOKEN_KID: &str = "test-kid";
pub const ID_TOKEN_KEY: &[u8] = b"identity_test_key_32_bytes_long!";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

#[allow(dead_code)]
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Create a test app on an in-memory store and a static-key identity verifier.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::default())
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config {
        frontend_url: frontend_url.to_string(),
        ..Config::default()
    })
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    create_test_app_with_db(config, FirestoreDb::new_in_memory())
}

#[allow(dead_code)]
pub fn create_test_app_with_db(config: Config, db: FirestoreDb) -> (axum::Router, Arc<AppState>) {
    let verifier = IdentityVerifier::new_with_static_key(
        &config,
        ID_TOKEN_KID,
        Algorithm::HS256,
        DecodingKey::from_secret(ID_TOKEN_KEY),
    )
    .expect("static verifier");

    let state = Arc::new(AppState::new(config, db, Arc::new(verifier)));
    (create_router(state.clone()), state)
}

/// Sign an identity token the test verifier accepts.
#[allow(dead_code)]
pub fn id_token(config: &Config, subject: &str, email: &str) -> String {
    let now = now_secs();
    let claims = serde_json::json!({
        "iss": format!("https://securetoken.google.com/{}", config.firebase_project_id),
        "aud": config.firebase_project_id,
        "sub": subject,
        "iat": now,
        "exp": now + 3600,
        "email": email,
        "email_verified": true,
    });

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(ID_TOKEN_KID.to_string());
    encode(&header, &claims, &EncodingKey::from_secret(ID_TOKEN_KEY)).unwrap()
}

/// Sign a session token directly, bypassing the allow-list.
#[allow(dead_code)]
pub fn session_token(config: &Config, email: &str, admin: bool, exp: u64) -> String {
    let claims = serde_json::json!({
        "sub": "uid-test",
        "email": email,
        "admin": admin,
        "iat": now_secs(),
        "exp": exp,
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&config.jwt_signing_key),
    )
    .unwrap()
}

/// Current TOTP code for a base32 secret.
#[allow(dead_code)]
pub fn totp_code(secret: &str) -> String {
    let bytes = data_encoding::BASE32.decode(secret.as_bytes()).unwrap();
    totp_rs::TOTP::new(totp_rs::Algorithm::SHA1, 6, 1, 30, bytes, None, String::new())
        .unwrap()
        .generate(now_secs())
}

/// A 6-digit code that differs from the current one.
#[allow(dead_code)]
pub fn wrong_totp_code(secret: &str) -> String {
    let right: u32 = totp_code(secret).parse().unwrap();
    format!("{:06}", (right + 500_000) % 1_000_000)
}

#[allow(dead_code)]
pub fn set_cookie_headers<B>(response: &Response<B>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

/// `name=value` pair from a Set-Cookie header, for replaying as a Cookie header.
#[allow(dead_code)]
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().trim().to_string()
}

#[allow(dead_code)]
pub async fn json_body(response: Response<axum::body::Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
