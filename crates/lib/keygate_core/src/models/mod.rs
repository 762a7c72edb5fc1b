//! Domain models shared by the core and its adapters.

pub mod auth;
