// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod accounting;

pub use accounting::AccountingEngine;
