//! Shared helpers for integration tests.

pub mod asset_server;
