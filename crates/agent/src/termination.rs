//! Agent termination reasons (spec §4.4), and how they're folded back into
//! a [`core::FlowError`] so the rest of the engine only ever has to deal
//! with the five ordinary error kinds.

use core::FlowError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    ObjectiveMet,
    IterationLimit,
    TimeBudgetExhausted,
    ToolError,
    PlannerError,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ObjectiveMet => "objective_met",
            Self::IterationLimit => "iteration_limit",
            Self::TimeBudgetExhausted => "time_budget_exhausted",
            Self::ToolError => "tool_error",
            Self::PlannerError => "planner_error",
        };
        write!(f, "{s}")
    }
}

/// Tag `err` with its termination reason, preserving the original error's
/// kind so the step's HTTP-mapping stays consistent further up the stack.
pub fn annotate(reason: TerminationReason, err: FlowError) -> FlowError {
    let message = format!("{reason}: {err}");
    match err {
        FlowError::NotFound(_) => FlowError::NotFound(message),
        FlowError::Validation(_) => FlowError::Validation(message),
        FlowError::QueueFull => FlowError::Internal(message),
        FlowError::UpstreamUnavailable(_) => FlowError::UpstreamUnavailable(message),
        FlowError::Budget(_) => FlowError::Budget(message),
        FlowError::Internal(_) => FlowError::Internal(message),
    }
}

/// Build a budget-exhaustion error with no underlying cause (the loop simply
/// ran out of iterations or time, not because a tool failed).
pub fn budget_exhausted(reason: TerminationReason) -> FlowError {
    FlowError::Budget(reason.to_string())
}
