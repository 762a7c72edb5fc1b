//! # keygate_core
//!
//! Core credential and token logic for Keygate.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
