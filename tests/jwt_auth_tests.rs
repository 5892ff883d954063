// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session JWT format tests.
//!
//! These tests pin the wire format of the session token so other services
//! holding the signing key can read it.

use admin_gate::config::{parse_admin_emails, Config};
use admin_gate::services::SessionIssuer;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Claims structure that must match what the issuer writes.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    admin: bool,
    exp: usize,
    iat: usize,
}

const WEEK_SECS: usize = 7 * 24 * 60 * 60;

#[test]
fn test_session_token_is_plain_hs256() {
    let config = Config::default();
    let issuer = SessionIssuer::from_config(&config);
    let token = issuer.mint("uid-42", "dev@dev.com").unwrap();

    let header = jsonwebtoken::decode_header(&token).unwrap();
    assert_eq!(header.alg, Algorithm::HS256);

    let key = DecodingKey::from_secret(&config.jwt_signing_key);
    let claims = decode::<Claims>(&token, &key, &Validation::new(Algorithm::HS256))
        .expect("Failed to decode JWT - check claims compatibility")
        .claims;

    assert_eq!(claims.sub, "uid-42");
    assert_eq!(claims.email, "dev@dev.com");
    assert!(claims.admin);
}

#[test]
fn test_session_expiration_is_seven_days() {
    let config = Config::default();
    let token = SessionIssuer::from_config(&config)
        .mint("uid-42", "dev@dev.com")
        .unwrap();

    let key = DecodingKey::from_secret(&config.jwt_signing_key);
    let claims = decode::<Claims>(&token, &key, &Validation::new(Algorithm::HS256))
        .unwrap()
        .claims;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    assert_eq!(claims.exp - claims.iat, WEEK_SECS);
    assert!(claims.iat <= now && now - claims.iat < 5);
}

#[test]
fn test_only_allow_listed_emails_are_minted() {
    let issuer = SessionIssuer::new(
        b"test_signing_key_32_bytes_long!!",
        parse_admin_emails("a@site.com,b@site.com"),
        Duration::from_secs(WEEK_SECS as u64),
    );

    for email in ["a@site.com", "B@Site.com"] {
        assert!(issuer.mint("uid", email).is_ok(), "{email}");
    }
    for email in ["c@site.com", "a@site.com.evil", "", "dev@dev.com"] {
        assert!(issuer.mint("uid", email).is_err(), "{email}");
    }
}

#[test]
fn test_missing_admin_claim_reads_as_false() {
    let config = Config::default();
    let issuer = SessionIssuer::from_config(&config);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(Algorithm::HS256),
        &serde_json::json!({ "sub": "uid", "email": "dev@dev.com", "iat": now, "exp": now + 60 }),
        &jsonwebtoken::EncodingKey::from_secret(&config.jwt_signing_key),
    )
    .unwrap();

    assert!(!issuer.decode(&token).unwrap().admin);
}
