//! A configurable [`ExecutableNode`] test double, used by the `agent`,
//! `scheduler`, and `engine` crates' test suites so they don't need real
//! network or filesystem access to exercise dispatch logic.

use async_trait::async_trait;
use core::FlowError;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::traits::ExecutableNode;
use services::Services;

/// Either echoes its input (optionally transformed) or fails with a fixed
/// error, counting how many times it was invoked.
pub struct MockNode {
    behavior: MockBehavior,
    calls: AtomicUsize,
}

enum MockBehavior {
    Echo(Option<String>),
    Fail(FlowError),
}

impl MockNode {
    /// Echoes the input text unchanged.
    pub fn echo() -> Self {
        Self { behavior: MockBehavior::Echo(None), calls: AtomicUsize::new(0) }
    }

    /// Ignores its input and always returns `output`.
    pub fn fixed_output(output: impl Into<String>) -> Self {
        Self { behavior: MockBehavior::Echo(Some(output.into())), calls: AtomicUsize::new(0) }
    }

    /// Always fails with `error`.
    pub fn failing(error: FlowError) -> Self {
        Self { behavior: MockBehavior::Fail(error), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutableNode for MockNode {
    async fn execute(&self, _config_snapshot: &Value, input_text: &str, _services: &Services) -> Result<String, FlowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockBehavior::Echo(None) => Ok(input_text.to_string()),
            MockBehavior::Echo(Some(fixed)) => Ok(fixed.clone()),
            MockBehavior::Fail(err) => Err(err.clone()),
        }
    }
}
