//! Retry classification for node failures.
//!
//! The run coordinator (spec §4.5) never retries an ordinary node's failure —
//! a failed batch member fails the job outright. Only the agent runtime
//! (spec §4.4) retries, and only its own tool calls, with an exponential
//! backoff capped at `max_retries`. [`classify`] is how the agent runtime
//! decides whether a given [`core::FlowError`] is worth retrying.

use core::FlowError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("retryable: {0}")]
    Retryable(String),
    #[error("fatal: {0}")]
    Fatal(String),
}

/// Classify a node failure for the agent runtime's retry loop.
///
/// Transient-looking failures (upstream unavailability, queue pressure) are
/// retryable; everything else — bad config, missing data, internal bugs — is
/// fatal on the first attempt.
pub fn classify(err: &FlowError) -> NodeError {
    match err {
        FlowError::UpstreamUnavailable(msg) => NodeError::Retryable(msg.clone()),
        FlowError::QueueFull => NodeError::Retryable("queue full".into()),
        FlowError::NotFound(msg) => NodeError::Fatal(msg.clone()),
        FlowError::Validation(msg) => NodeError::Fatal(msg.clone()),
        FlowError::Budget(msg) => NodeError::Fatal(msg.clone()),
        FlowError::Internal(msg) => NodeError::Fatal(msg.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_unavailable_is_retryable() {
        assert!(matches!(
            classify(&FlowError::UpstreamUnavailable("timeout".into())),
            NodeError::Retryable(_)
        ));
    }

    #[test]
    fn validation_is_fatal() {
        assert!(matches!(classify(&FlowError::Validation("bad config".into())), NodeError::Fatal(_)));
    }

    #[test]
    fn rate_limited_llm_response_is_retryable() {
        let err: FlowError =
            services::ServiceError::NonSuccessResponse { status: 429, body: "slow down".into() }.into();
        assert!(matches!(classify(&err), NodeError::Retryable(_)));
    }

    #[test]
    fn bad_request_llm_response_is_fatal() {
        let err: FlowError =
            services::ServiceError::NonSuccessResponse { status: 400, body: "malformed prompt".into() }.into();
        assert!(matches!(classify(&err), NodeError::Fatal(_)));
    }
}
