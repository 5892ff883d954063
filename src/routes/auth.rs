// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes: identity-token login and logout.

use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::cookies;
use crate::error::{AppError, Result};
use crate::routes::OkResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/create-session", post(create_session))
        .route("/api/logout", post(logout))
}

/// Login request carrying the identity provider's ID token.
#[derive(Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[serde(default, rename = "idToken")]
    #[validate(length(min = 1, message = "idToken is required"))]
    id_token: String,
}

/// Exchange an ID token for the admin session cookie.
async fn create_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(CookieJar, Json<OkResponse>)> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let token = state
        .session_issuer
        .issue(&state.identity_verifier, &request.id_token)
        .await?;

    let jar = cookies::set_session_cookie(jar, token, &state.config);
    Ok((jar, Json(OkResponse::ok())))
}

/// Logout - expire the session and second-factor cookies.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Json<OkResponse>) {
    tracing::info!("Admin logout");
    (cookies::clear_all(jar, &state.config), Json(OkResponse::ok()))
}
