// SPDX-License-Identifier: MIT

//! Record store layer (Redis).

pub mod record;

pub use record::RecordStore;

/// Record key construction.
pub mod keys {
    /// Key for a user's e-bike document: `ebike:{userId}`.
    pub fn record(user_id: &str) -> String {
        format!("ebike:{}", user_id)
    }
}
