// SPDX-License-Identifier: MIT

//! E-Bike Tracker: single-user mileage and battery accounting API
//!
//! This crate provides the backend API for logging e-bike trips, detecting
//! full-charge events, and maintaining a per-day mileage ledger with bounded
//! retention.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod time_utils;

use config::Config;
use services::AccountingEngine;
use store::RecordStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: RecordStore,
    pub accounting: AccountingEngine,
}
