//! Terminal outcomes of a pipeline invocation.

use serde::{Serialize, Serializer};
use uuid::Uuid;

use telewatch_core::notify::DispatchError;
use telewatch_core::reading::{Reading, RecordDecodeError};
use telewatch_core::request::EvaluationMode;
use telewatch_core::source::SourceError;
use telewatch_core::thresholds::Violation;

/// How one check ended. Variants are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The store could not be read. Nothing else ran.
    SourceUnavailable {
        #[serde(serialize_with = "display")]
        error: SourceError,
    },
    /// No decodable reading with a usable timestamp.
    EmptyDataset,
    /// Processed, no threshold violated.
    NoViolation { reading: Reading },
    /// Violation found and the sink accepted the alert.
    AlertDelivered { violation: Violation },
    /// Violation found but the alert was not delivered.
    DeliveryFailed {
        violation: Violation,
        #[serde(serialize_with = "display")]
        error: DispatchError,
    },
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::SourceUnavailable { .. } => OutcomeKind::SourceUnavailable,
            Outcome::EmptyDataset => OutcomeKind::EmptyDataset,
            Outcome::NoViolation { .. } => OutcomeKind::NoViolation,
            Outcome::AlertDelivered { .. } => OutcomeKind::AlertDelivered,
            Outcome::DeliveryFailed { .. } => OutcomeKind::DeliveryFailed,
        }
    }

    /// Only an unreachable store aborts an invocation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Outcome::SourceUnavailable { .. })
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Outcome::AlertDelivered { violation } | Outcome::DeliveryFailed { violation, .. } => {
                Some(violation)
            }
            _ => None,
        }
    }
}

/// Fieldless mirror of [`Outcome`] for counting and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    SourceUnavailable,
    EmptyDataset,
    NoViolation,
    AlertDelivered,
    DeliveryFailed,
}

impl OutcomeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::SourceUnavailable => "source_unavailable",
            OutcomeKind::EmptyDataset => "empty_dataset",
            OutcomeKind::NoViolation => "no_violation",
            OutcomeKind::AlertDelivered => "alert_delivered",
            OutcomeKind::DeliveryFailed => "delivery_failed",
        }
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// InvocationReport
// ---------------------------------------------------------------------------

/// Summary returned to the caller of one invocation.
///
/// Holds at least one outcome. In [`EvaluationMode::Latest`] there is exactly
/// one; in [`EvaluationMode::PerDevice`] there is one per device, or a single
/// `SourceUnavailable` / `EmptyDataset` when nothing could be checked.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationReport {
    pub invocation_id: Uuid,
    pub mode: EvaluationMode,
    /// Records skipped because they did not decode.
    pub decode_errors: Vec<RecordDecodeError>,
    outcomes: Vec<Outcome>,
}

impl InvocationReport {
    pub(crate) fn new(
        invocation_id: Uuid,
        mode: EvaluationMode,
        decode_errors: Vec<RecordDecodeError>,
        first: Outcome,
        rest: Vec<Outcome>,
    ) -> Self {
        let mut outcomes = Vec::with_capacity(rest.len() + 1);
        outcomes.push(first);
        outcomes.extend(rest);
        Self {
            invocation_id,
            mode,
            decode_errors,
            outcomes,
        }
    }

    /// The first (in latest mode, the only) outcome.
    pub fn outcome(&self) -> &Outcome {
        &self.outcomes[0]
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn is_fatal(&self) -> bool {
        self.outcome().is_fatal()
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.kind() == kind).count()
    }
}

fn display<T: std::fmt::Display, S: Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
