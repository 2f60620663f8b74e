//! External delivery channels for telemetry alerts.

pub mod webhook;
