use serde::Serialize;

use crate::RequestError;

/// Outcome of classifying one HTTP status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusDecision {
    /// The response finalizes the request successfully.
    pub accept: bool,
    /// A rejected response may be retried if budget remains.
    pub is_retry_allowed: bool,
}

impl StatusDecision {
    pub const fn accepted() -> Self {
        Self {
            accept: true,
            is_retry_allowed: true,
        }
    }

    pub const fn retry() -> Self {
        Self {
            accept: false,
            is_retry_allowed: true,
        }
    }

    pub const fn fail() -> Self {
        Self {
            accept: false,
            is_retry_allowed: false,
        }
    }
}

/// Decides which attempt outcomes finalize a request and which may be retried.
///
/// Any `Fn(u16) -> StatusDecision` closure is a policy, with the default
/// transport-error rule.
pub trait StatusPolicy: Send + Sync {
    fn classify(&self, status: u16) -> StatusDecision;

    /// Whether a failed attempt that produced no status code may be retried.
    ///
    /// Timeouts, connection and body errors are eligible by default; request
    /// building errors are not.
    fn retry_transport_error(&self, error: &RequestError) -> bool {
        error.is_retriable()
    }
}

impl<F> StatusPolicy for F
where
    F: Fn(u16) -> StatusDecision + Send + Sync,
{
    fn classify(&self, status: u16) -> StatusDecision {
        self(status)
    }
}

/// Accepts `200` and `201`, refuses to retry `401`, retries everything else.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultStatusPolicy;

impl StatusPolicy for DefaultStatusPolicy {
    fn classify(&self, status: u16) -> StatusDecision {
        match status {
            200 | 201 => StatusDecision::accepted(),
            401 => StatusDecision::fail(),
            _ => StatusDecision::retry(),
        }
    }
}
