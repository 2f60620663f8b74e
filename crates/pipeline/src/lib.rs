//! Telewatch pipeline orchestration.
//!
//! Wires a [`ReadingStore`](telewatch_core::ReadingStore) and a
//! [`Notifier`](telewatch_core::Notifier) through the pure core stages and
//! reports how each invocation ended.

pub mod orchestrator;
pub mod outcome;

pub use orchestrator::Pipeline;
pub use outcome::{InvocationReport, Outcome, OutcomeKind};
