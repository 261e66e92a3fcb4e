//! Bounded autonomous agent runtime (spec §4.4, C3).

pub mod node;
pub mod planner;
pub mod runtime;
pub mod termination;

pub use node::AgentNode;
pub use runtime::run_agent;
pub use termination::TerminationReason;
