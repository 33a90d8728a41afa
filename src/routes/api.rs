// SPDX-License-Identifier: MIT

//! API routes for the authenticated user's e-bike record.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{DocumentPatch, EbikeDocument};
use crate::time_utils::parse_day_key;
use crate::AppState;
use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Data routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/data", get(get_data).post(save_data))
}

/// Get the user's document, materializing defaults when none is persisted.
/// Never writes on read: a new user's defaults are not stored until the
/// first save.
async fn get_data(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<EbikeDocument>> {
    let document = state.store.get(&user.user_id).await?.unwrap_or_default();
    Ok(Json(document))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub message: String,
    pub updated_data: EbikeDocument,
}

/// Apply a partial update through the accounting engine and persist the
/// result with a refreshed TTL.
async fn save_data(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(patch): Json<DocumentPatch>,
) -> Result<Json<SaveResponse>> {
    let previous = state.store.get(&user.user_id).await?;

    // The client's day key wins over the server clock when parseable;
    // malformed values fall back to server-side day computation.
    let client_date = patch.client_date.as_deref().and_then(|raw| {
        let parsed = parse_day_key(raw);
        if parsed.is_none() {
            tracing::warn!(raw, "Ignoring malformed clientDate");
        }
        parsed
    });

    let updated = state
        .accounting
        .apply(previous, &patch, chrono::Utc::now(), client_date);

    state
        .store
        .put(&user.user_id, &updated, state.config.record_ttl_seconds)
        .await?;

    tracing::debug!(user_id = %user.user_id, "Record saved");

    Ok(Json(SaveResponse {
        message: "Data saved successfully".to_string(),
        updated_data: updated,
    }))
}
