//! Telewatch core domain logic.
//!
//! Everything in this crate is pure except the two boundary traits,
//! [`ReadingStore`] and [`Notifier`], which adapters in other crates
//! implement.

pub mod alert;
pub mod error;
pub mod notify;
pub mod reading;
pub mod request;
pub mod selector;
pub mod source;
pub mod thresholds;
pub mod types;

pub use alert::{format_alert, AlertField, AlertPayload};
pub use error::CoreError;
pub use notify::{DispatchError, Notifier};
pub use reading::{decode_records, DecodedBatch, Reading, RecordDecodeError};
pub use request::{EvaluationMode, InvocationRequest};
pub use selector::{select_latest, select_latest_per_device};
pub use source::{ReadingStore, SourceError};
pub use thresholds::{evaluate, Bound, Metric, ThresholdConfig, ThresholdRule, Violation};
