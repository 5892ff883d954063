// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin access gate.
//!
//! Every request under `/admin` is classified from two cookies, the signed
//! session and the second-factor marker, and either admitted or redirected.
//! Nothing is stored between requests.

use crate::cookies;
use crate::services::{SessionClaims, SessionIssuer};
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Outcome of classifying a request against the admin gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    /// Missing, malformed, forged or expired session cookie.
    NoSession,
    SessionNotAdmin,
    /// Admin session without the second-factor marker.
    SessionNo2fa,
    Authorized,
}

/// Authenticated admin extracted from the session.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub subject: String,
    pub email: String,
}

/// Classify from an already-validated session (or none) and marker presence.
pub fn classify(session: Option<&SessionClaims>, marker_present: bool) -> AccessState {
    match session {
        None => AccessState::NoSession,
        Some(claims) if !claims.admin => AccessState::SessionNotAdmin,
        Some(_) if !marker_present => AccessState::SessionNo2fa,
        Some(_) => AccessState::Authorized,
    }
}

/// Decode the session cookie and classify the request.
pub fn classify_request(
    jar: &CookieJar,
    issuer: &SessionIssuer,
) -> (AccessState, Option<SessionClaims>) {
    let claims = cookies::session_token(jar).and_then(|token| issuer.decode(token));
    let state = classify(claims.as_ref(), cookies::has_marker(jar));
    (state, claims)
}

/// Middleware that admits only fully authenticated admins.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let (access, claims) = classify_request(&jar, &state.session_issuer);
    let path = request.uri().path().to_string();

    let target = match (access, claims) {
        (AccessState::Authorized, Some(claims)) => {
            request.extensions_mut().insert(AdminUser {
                subject: claims.sub,
                email: claims.email,
            });
            return next.run(request).await;
        }
        (AccessState::NoSession, _) | (AccessState::Authorized, None) => &state.config.login_path,
        (AccessState::SessionNotAdmin, _) => &state.config.unauthorized_path,
        (AccessState::SessionNo2fa, _) => &state.config.two_factor_path,
    };

    tracing::debug!(path = %path, access = ?access, redirect = %target, "Admin gate redirect");
    Redirect::temporary(target).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(admin: bool) -> SessionClaims {
        SessionClaims {
            sub: "uid-1".to_string(),
            email: "dev@dev.com".to_string(),
            admin,
            iat: 0,
            exp: usize::MAX,
            sid: "sid-1".to_string(),
        }
    }

    #[test]
    fn classification_truth_table() {
        // (session valid, admin claim, marker present) -> state
        let table = [
            (false, false, false, AccessState::NoSession),
            (false, false, true, AccessState::NoSession),
            (false, true, false, AccessState::NoSession),
            (false, true, true, AccessState::NoSession),
            (true, false, false, AccessState::SessionNotAdmin),
            (true, false, true, AccessState::SessionNotAdmin),
            (true, true, false, AccessState::SessionNo2fa),
            (true, true, true, AccessState::Authorized),
        ];

        for (valid, admin, marker, expected) in table {
            let session = claims(admin);
            let session = valid.then_some(&session);
            assert_eq!(
                classify(session, marker),
                expected,
                "valid={valid} admin={admin} marker={marker}"
            );
        }
    }

    #[test]
    fn classify_request_fails_closed_on_bad_tokens() {
        let issuer = SessionIssuer::new(
            b"test_signing_key_32_bytes_long!!",
            crate::config::parse_admin_emails("dev@dev.com"),
            std::time::Duration::from_secs(60),
        );
        let jar = CookieJar::new()
            .add(axum_extra::extract::cookie::Cookie::new(
                cookies::SESSION_COOKIE,
                "forged.token.value",
            ))
            .add(axum_extra::extract::cookie::Cookie::new(
                cookies::MARKER_COOKIE,
                "true",
            ));

        let (state, claims) = classify_request(&jar, &issuer);
        assert_eq!(state, AccessState::NoSession);
        assert!(claims.is_none());

        let token = issuer.mint("uid-1", "dev@dev.com").unwrap();
        let jar = jar.add(axum_extra::extract::cookie::Cookie::new(
            cookies::SESSION_COOKIE,
            token,
        ));
        assert_eq!(classify_request(&jar, &issuer).0, AccessState::Authorized);
    }
}
