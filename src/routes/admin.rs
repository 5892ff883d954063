// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin routes (behind the access gate).

use crate::error::{AppError, Result};
use crate::middleware::auth::AdminUser;
use crate::AppState;
use axum::{
    routing::{any, get},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Admin routes. The gate is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(get_session))
        .route("/admin/session", get(get_session))
        .route("/admin/{*path}", any(not_found))
}

/// Signed-in admin response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AdminSessionResponse {
    pub subject: String,
    pub email: String,
}

async fn get_session(Extension(admin): Extension<AdminUser>) -> Json<AdminSessionResponse> {
    Json(AdminSessionResponse {
        subject: admin.subject,
        email: admin.email,
    })
}

async fn not_found(Extension(admin): Extension<AdminUser>) -> Result<()> {
    tracing::debug!(email = %admin.email, "Unknown admin path");
    Err(AppError::NotFound("admin page".to_string()))
}
