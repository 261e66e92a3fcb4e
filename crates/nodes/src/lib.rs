//! Node executors (spec §4.2): one [`ExecutableNode`] implementation per
//! [`core::NodeType`], plus the config schemas they validate against.

pub mod config;
pub mod error;
pub mod extract_text;
pub mod formatter;
pub mod generative_ai;
pub mod mock;
pub mod traits;

pub use config::validate_config;
pub use error::{classify, NodeError};
pub use extract_text::ExtractTextNode;
pub use formatter::{apply_rules, FormatterNode};
pub use generative_ai::GenerativeAiNode;
pub use mock::MockNode;
pub use traits::ExecutableNode;
