// SPDX-License-Identifier: MIT

use ebike_tracker::config::Config;
use ebike_tracker::routes::create_router;
use ebike_tracker::services::AccountingEngine;
use ebike_tracker::store::RecordStore;
use ebike_tracker::AppState;
use std::sync::Arc;

/// Create a test app with an in-memory record store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let store = RecordStore::new_memory();
    let accounting = AccountingEngine::new(config.utc_offset_hours, config.retention_months);

    let state = Arc::new(AppState {
        config,
        store,
        accounting,
    });

    (create_router(state.clone()), state)
}

/// Create a test JWT accepted by the app's auth middleware.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, username: &str, signing_key: &[u8]) -> String {
    ebike_tracker::middleware::auth::create_jwt(user_id, username, signing_key)
        .expect("Failed to create JWT")
}

/// Collect a response body as parsed JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body was not valid JSON")
}
