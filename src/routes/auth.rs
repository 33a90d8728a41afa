// SPDX-License-Identifier: MIT

//! Static-credential authentication routes.
//!
//! The single configured user logs in with username/password and receives a
//! session JWT. Any other identity strategy only needs to mint a compatible
//! token; nothing downstream branches on how the session was issued.

use axum::{extract::State, routing::get, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::AppState;

/// Stable user ID for the single-user deployment.
const STATIC_USER_ID: &str = "1";

/// Routes reachable without a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/login", post(login))
}

/// Routes that require a valid session (layered in routes/mod.rs).
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/status", get(auth_status))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

/// Exchange static credentials for a session token.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    // Constant-time comparison; evaluate both fields before deciding
    let username_ok = body
        .username
        .as_bytes()
        .ct_eq(state.config.app_username.as_bytes());
    let password_ok = body
        .password
        .as_bytes()
        .ct_eq(state.config.app_password.as_bytes());

    if !bool::from(username_ok & password_ok) {
        tracing::warn!("Rejected login attempt");
        return Err(AppError::InvalidCredentials);
    }

    let token = create_jwt(
        STATIC_USER_ID,
        &state.config.app_username,
        &state.config.jwt_signing_key,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(user_id = STATIC_USER_ID, "Login successful");

    Ok(Json(LoginResponse {
        token,
        user: SessionUser {
            id: STATIC_USER_ID.to_string(),
            username: state.config.app_username.clone(),
        },
    }))
}

#[derive(Serialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    pub user: SessionUser,
}

/// Report session validity; reaching this handler means the token was valid.
async fn auth_status(Extension(user): Extension<AuthUser>) -> Json<AuthStatusResponse> {
    Json(AuthStatusResponse {
        authenticated: true,
        user: SessionUser {
            id: user.user_id,
            username: user.username,
        },
    })
}
