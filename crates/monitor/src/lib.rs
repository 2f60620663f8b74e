//! `telewatch-monitor` library crate.
//!
//! Re-exports the monitor's modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod app;
pub mod config;
pub mod scheduler;
