// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! TOTP enrollment, verification and second-factor confirmation routes.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::cookies;
use crate::error::{AppError, Result};
use crate::routes::OkResponse;
use crate::services::{normalize_email, SetupOutcome};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/2fa/setup", post(setup))
        .route("/api/2fa/status", get(status))
        .route("/api/2fa/verify", post(verify))
        .route("/api/2fa/confirm", post(confirm))
}

#[derive(Deserialize, Validate)]
pub struct EmailParams {
    #[serde(default)]
    #[validate(email(message = "a valid email is required"))]
    email: String,
}

#[derive(Deserialize, Validate)]
pub struct VerifyRequest {
    #[serde(default)]
    #[validate(email(message = "a valid email is required"))]
    email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "code is required"))]
    code: String,
}

// ─── Setup ───────────────────────────────────────────────────

/// Setup response: a QR to scan, or a note that 2FA is already active.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(untagged)]
pub enum SetupResponse {
    Provisioned {
        qr: String,
        otpauth: String,
    },
    AlreadyEnabled {
        #[serde(rename = "alreadyEnabled")]
        already_enabled: bool,
    },
}

async fn setup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmailParams>,
) -> Result<Json<SetupResponse>> {
    validate(&request)?;

    let response = match state.two_factor.setup(&request.email).await? {
        SetupOutcome::Provisioned { qr, otpauth } => SetupResponse::Provisioned { qr, otpauth },
        SetupOutcome::AlreadyEnabled => SetupResponse::AlreadyEnabled {
            already_enabled: true,
        },
    };

    Ok(Json(response))
}

// ─── Status ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatusResponse {
    pub enabled: bool,
    pub verified: bool,
}

async fn status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EmailParams>,
) -> Result<Json<StatusResponse>> {
    validate(&params)?;

    let status = state.two_factor.status(&params.email).await?;
    Ok(Json(StatusResponse {
        enabled: status.enabled,
        verified: status.verified,
    }))
}

// ─── Verify / Confirm ────────────────────────────────────────

async fn verify(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<OkResponse>> {
    validate(&request)?;

    // Only an admin session for the same email may later confirm this code.
    let session_id = cookies::session_token(&jar)
        .and_then(|token| state.session_issuer.decode(token))
        .filter(|claims| {
            claims.admin && normalize_email(&claims.email) == normalize_email(&request.email)
        })
        .map(|claims| claims.sid);

    state
        .two_factor
        .verify(&request.email, &request.code, session_id.as_deref())
        .await?;
    Ok(Json(OkResponse::ok()))
}

/// Set the second-factor marker for the signed-in admin.
///
/// Consumes the confirmation left by a verify made with this session's
/// cookie; a second call, or any other session, is refused.
async fn confirm(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<OkResponse>)> {
    let claims = cookies::session_token(&jar)
        .and_then(|token| state.session_issuer.decode(token))
        .ok_or(AppError::Unauthorized)?;

    if !claims.admin {
        return Err(AppError::Forbidden("admin session required".to_string()));
    }

    if let Err(e) = state
        .two_factor
        .confirm(&claims.email, &claims.sid)
        .await
    {
        tracing::warn!(email = %claims.email, error = %e, "2FA confirm refused");
        return Err(e);
    }

    tracing::info!(email = %claims.email, "2FA marker set");
    let jar = cookies::set_marker_cookie(jar, &state.config);
    Ok((jar, Json(OkResponse::ok())))
}

fn validate(request: &impl Validate) -> Result<()> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}
