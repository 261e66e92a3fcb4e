//! `services` crate — the capability bundle node executors depend on
//! (spec §4.2: "PDF store, LLM client, clock, logger"). Logging is ambient
//! (`tracing`, used throughout); the other three are explicit traits so
//! tests can substitute fakes without touching the network or filesystem.

pub mod clock;
pub mod error;
pub mod files;
pub mod llm;
pub mod pdf;

use std::sync::Arc;

pub use clock::{Clock, SystemClock};
pub use error::ServiceError;
pub use files::{FileStore, LoadedFile};
pub use llm::{HttpLlmClient, LlmClient, LlmRequest, LlmResponse, ALLOWED_MODELS};
pub use pdf::extract_pdf_text;

/// The bundle passed to every `ExecutableNode::execute` call.
#[derive(Clone)]
pub struct Services {
    pub llm: Arc<dyn LlmClient>,
    pub files: Arc<dyn FileStore>,
    pub clock: Arc<dyn Clock>,
}

impl Services {
    pub fn new(llm: Arc<dyn LlmClient>, files: Arc<dyn FileStore>, clock: Arc<dyn Clock>) -> Self {
        Self { llm, files, clock }
    }
}
