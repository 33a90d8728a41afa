// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod document;

pub use document::{Destination, DocumentPatch, EbikeDocument};
