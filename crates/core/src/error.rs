//! Shared error kinds (spec §7), used above the `db` crate boundary.

use thiserror::Error;

/// The five error kinds the engine ever surfaces to a caller, plus
/// `Internal` for anything unexpected. Every crate above `db` converts its
/// own error type into one of these so the API layer has a single place to
/// map errors onto HTTP status codes.
#[derive(Debug, Error, Clone)]
pub enum FlowError {
    /// Entity missing; HTTP 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad config, bad edge, cycle detected, unsupported rule; HTTP 400.
    #[error("validation error: {0}")]
    Validation(String),

    /// Admission refused; HTTP 429.
    #[error("queue full")]
    QueueFull,

    /// LLM/network failure; retried per agent policy, otherwise step failed.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Agent exhausted its time/iteration/retry budget.
    #[error("budget exhausted: {0}")]
    Budget(String),

    /// Unexpected failure; sanitized detail only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FlowError {
    /// Stable string tag for this error kind, used in step logs and the
    /// `"<node_id>: <step_error>"` job error message format (spec §4.5).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NotFound",
            Self::Validation(_) => "Validation",
            Self::QueueFull => "QueueFull",
            Self::UpstreamUnavailable(_) => "UpstreamUnavailable",
            Self::Budget(_) => "Budget",
            Self::Internal(_) => "Internal",
        }
    }
}
