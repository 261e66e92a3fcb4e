//! The `formatter` node type and its rule set (spec §4.2).
//!
//! `apply_rules` is also reused by the agent runtime's `formatter` tool
//! (spec §4.4), which is why it lives as a free function rather than being
//! buried inside [`FormatterNode`].

use async_trait::async_trait;
use core::FlowError;
use serde_json::Value;

use crate::config::{parse_formatter, FormatterRule};
use crate::traits::ExecutableNode;
use services::Services;

/// Apply formatter rules to `text` in listed order. An empty rule list is a
/// no-op; an unrecognized rule fails (rejected earlier by config validation,
/// so in practice this only sees the four known variants).
pub fn apply_rules(text: &str, rules: &[FormatterRule]) -> Result<String, FlowError> {
    let mut out = text.to_string();
    for rule in rules {
        out = match rule {
            FormatterRule::Lowercase => out.to_lowercase(),
            FormatterRule::Uppercase => out.to_uppercase(),
            FormatterRule::FullToHalf => full_to_half(&out),
            FormatterRule::HalfToFull => half_to_full(&out),
        };
    }
    Ok(out)
}

/// Convert full-width ASCII digits/letters/punctuation (U+FF01-FF5E) and the
/// ideographic space (U+3000) to their half-width equivalents.
fn full_to_half(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => {
                char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
            }
            other => other,
        })
        .collect()
}

/// Convert half-width ASCII digits/letters/punctuation and the regular space
/// to their full-width equivalents — the inverse of [`full_to_half`].
fn half_to_full(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ' ' => '\u{3000}',
            '\u{0021}'..='\u{007E}' => {
                char::from_u32(c as u32 + 0xFEE0).unwrap_or(c)
            }
            other => other,
        })
        .collect()
}

pub struct FormatterNode;

#[async_trait]
impl ExecutableNode for FormatterNode {
    async fn execute(&self, config_snapshot: &Value, input_text: &str, _services: &Services) -> Result<String, FlowError> {
        let config = parse_formatter(config_snapshot)?;
        apply_rules(input_text, &config.rules)
    }
}
