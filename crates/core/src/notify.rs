//! Notification sink abstraction.

use async_trait::async_trait;

use crate::alert::AlertPayload;

/// A failed delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The sink answered with something other than its "accepted" status.
    #[error("Sink returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The sink could not be reached (DNS, connect, timeout, etc.).
    #[error("Sink unreachable: {0}")]
    Unreachable(String),

    /// Delivery was abandoned because the invocation was cancelled.
    #[error("Dispatch cancelled")]
    Cancelled,
}

impl DispatchError {
    /// HTTP status returned by the sink, if it answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DispatchError::Rejected { status, .. } => Some(*status),
            DispatchError::Unreachable(_) | DispatchError::Cancelled => None,
        }
    }
}

/// Delivers alert payloads to an external sink.
///
/// Implementations make exactly one delivery attempt per call and never
/// retry; retry policy belongs to the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, payload: &AlertPayload) -> Result<(), DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_only_for_rejections() {
        let rejected = DispatchError::Rejected {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(rejected.status_code(), Some(429));
        assert_eq!(
            DispatchError::Unreachable("connection refused".into()).status_code(),
            None
        );
        assert_eq!(DispatchError::Cancelled.status_code(), None);
    }

    #[test]
    fn rejected_display_includes_status_and_body() {
        let err = DispatchError::Rejected {
            status: 400,
            body: "{\"message\":\"Cannot send an empty message\"}".into(),
        };
        assert_eq!(
            err.to_string(),
            "Sink returned HTTP 400: {\"message\":\"Cannot send an empty message\"}"
        );
    }
}
