// SPDX-License-Identifier: MIT

//! Redis-backed record store with typed operations.
//!
//! Holds one JSON document per user with a sliding expiration. Absence is not
//! an error: a record that expired is indistinguishable from a new user.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;

use crate::error::AppError;
use crate::models::EbikeDocument;
use crate::store::keys;

/// Key-value store for per-user e-bike documents.
#[derive(Clone)]
pub struct RecordStore {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Redis(ConnectionManager),
    /// In-process map, used by integration tests. TTL is not simulated.
    Memory(Arc<DashMap<String, String>>),
    /// Every operation errors, for tests that only exercise auth paths.
    Offline,
}

impl RecordStore {
    /// Connect to Redis. The connection manager reconnects on its own; store
    /// timeouts and retries live here, not in the accounting engine.
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(500));

        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Database(format!("Invalid Redis URL: {}", e)))?;
        let manager = client
            .get_connection_manager_with_config(config)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Redis: {}", e)))?;

        tracing::info!("Connected to Redis");

        Ok(Self {
            backend: Backend::Redis(manager),
        })
    }

    /// Create an in-memory store for testing.
    pub fn new_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    /// Create a disconnected store; all operations return an error.
    pub fn new_offline() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    /// Fetch a user's document. Returns `None` when no record exists (or it
    /// has expired); a record that fails to parse is a store error.
    pub async fn get(&self, user_id: &str) -> Result<Option<EbikeDocument>, AppError> {
        let key = keys::record(user_id);

        let raw: Option<String> = match &self.backend {
            Backend::Redis(manager) => {
                let mut conn = manager.clone();
                conn.get(&key)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?
            }
            Backend::Memory(map) => map.get(&key).map(|entry| entry.value().clone()),
            Backend::Offline => {
                return Err(AppError::Database(
                    "Store not connected (offline mode)".to_string(),
                ))
            }
        };

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| AppError::Database(format!("Corrupt record at {}: {}", key, e)))
        })
        .transpose()
    }

    /// Persist a user's document with a refreshed sliding TTL.
    pub async fn put(
        &self,
        user_id: &str,
        document: &EbikeDocument,
        ttl_seconds: u64,
    ) -> Result<(), AppError> {
        let key = keys::record(user_id);
        let json = serde_json::to_string(document)
            .map_err(|e| AppError::Database(format!("Failed to serialize record: {}", e)))?;

        match &self.backend {
            Backend::Redis(manager) => {
                let mut conn = manager.clone();
                let _: () = conn
                    .set_ex(&key, json, ttl_seconds)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(map) => {
                map.insert(key, json);
            }
            Backend::Offline => {
                return Err(AppError::Database(
                    "Store not connected (offline mode)".to_string(),
                ))
            }
        }

        Ok(())
    }

    /// Insert a raw value, bypassing serialization (memory backend only).
    #[cfg(test)]
    fn insert_raw(&self, user_id: &str, raw: &str) {
        if let Backend::Memory(map) = &self.backend {
            map.insert(keys::record(user_id), raw.to_string());
        }
    }
}
