//! Shared utilities

pub mod auth;
