//! Error type for the capability bundle.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ServiceError {
    #[error("llm transport error: {0}")]
    Transport(String),

    #[error("llm returned non-2xx response: {status}: {body}")]
    NonSuccessResponse { status: u16, body: String },

    #[error("unsupported model '{0}'")]
    UnsupportedModel(String),

    #[error("pdf extraction failed: {0}")]
    PdfExtraction(String),

    #[error("file not found: {0}")]
    FileNotFound(uuid::Uuid),

    #[error("file read error: {0}")]
    Io(String),
}

impl From<ServiceError> for core::FlowError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Transport(msg) => core::FlowError::UpstreamUnavailable(msg),
            ServiceError::NonSuccessResponse { status, body } => {
                // Only rate-limiting and server-side failures are transient
                // (spec §4.4: "transport/rate-limit from LLM"); any other
                // 4xx (bad prompt, auth, not found) is permanent and must
                // abort the agent's retry loop immediately rather than
                // burn its retry budget on a request that will never
                // succeed.
                if status == 429 || status >= 500 {
                    core::FlowError::UpstreamUnavailable(format!("status {status}: {body}"))
                } else {
                    core::FlowError::Validation(format!("status {status}: {body}"))
                }
            }
            ServiceError::UnsupportedModel(model) => {
                core::FlowError::Validation(format!("unsupported model '{model}'"))
            }
            ServiceError::PdfExtraction(msg) => core::FlowError::Validation(msg),
            ServiceError::FileNotFound(id) => core::FlowError::NotFound(format!("file {id}")),
            ServiceError::Io(msg) => core::FlowError::Internal(msg),
        }
    }
}
