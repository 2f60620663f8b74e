//! Telewatch alert delivery.
//!
//! - [`WebhookNotifier`]: single-attempt HTTP webhook sink implementing
//!   [`telewatch_core::Notifier`].

pub mod delivery;

pub use delivery::webhook::{WebhookConfig, WebhookError, WebhookFormat, WebhookNotifier};
