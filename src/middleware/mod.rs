// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (admin access gate).

pub mod auth;

pub use auth::{classify, require_admin, AccessState, AdminUser};
