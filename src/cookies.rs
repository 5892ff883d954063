// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session and second-factor cookies.
//!
//! Removal rewrites each cookie with the attributes it was created with so
//! browsers match and drop it.

use crate::config::Config;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

pub const SESSION_COOKIE: &str = "session";
pub const MARKER_COOKIE: &str = "2fa_verified";
const MARKER_VALUE: &str = "true";

fn build(
    name: &'static str,
    value: String,
    same_site: SameSite,
    max_age: Duration,
    config: &Config,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(same_site)
        .secure(config.secure_cookies())
        .max_age(max_age)
        .build()
}

fn ttl(config: &Config) -> Duration {
    Duration::seconds(config.session_ttl.as_secs() as i64)
}

pub fn set_session_cookie(jar: CookieJar, token: String, config: &Config) -> CookieJar {
    jar.add(build(SESSION_COOKIE, token, SameSite::Strict, ttl(config), config))
}

pub fn set_marker_cookie(jar: CookieJar, config: &Config) -> CookieJar {
    jar.add(build(
        MARKER_COOKIE,
        MARKER_VALUE.to_string(),
        SameSite::Lax,
        ttl(config),
        config,
    ))
}

/// Expire both cookies immediately.
pub fn clear_all(jar: CookieJar, config: &Config) -> CookieJar {
    let expired = |name, same_site| {
        let mut cookie = build(name, String::new(), same_site, Duration::ZERO, config);
        cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
        cookie
    };

    jar.add(expired(SESSION_COOKIE, SameSite::Strict))
        .add(expired(MARKER_COOKIE, SameSite::Lax))
}

/// The marker counts by presence; its value is not inspected.
pub fn has_marker(jar: &CookieJar) -> bool {
    jar.get(MARKER_COOKIE).is_some()
}

/// Session token from the cookie, ignoring blank values left by logout.
pub fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty())
}
