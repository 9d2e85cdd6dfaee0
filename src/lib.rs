//! Credential authentication: password hashing, JWT issuance and validation,
//! and register/login over a pluggable user store.

pub mod app;
pub mod auth;
pub mod config;
pub mod state;
