use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::ExtractError;

static JSON_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```[ \t]*json\b[^\n]*\n?").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    FencedBlock,
    WholeText,
    BracketSpan,
}

impl PayloadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadSource::FencedBlock => "fenced_block",
            PayloadSource::WholeText => "whole_text",
            PayloadSource::BracketSpan => "bracket_span",
        }
    }
}

/// Finds the substring of `raw` that should hold the JSON payload.
pub fn locate_payload(raw: &str) -> Option<(&str, PayloadSource)> {
    if let Some(open) = JSON_FENCE_RE.find(raw) {
        let rest = &raw[open.end()..];
        let interior = match rest.find("```") {
            Some(close) => &rest[..close],
            // A stream cut short can leave the fence unterminated.
            None => rest,
        };
        return Some((interior.trim(), PayloadSource::FencedBlock));
    }
    let trimmed = raw.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        return Some((trimmed, PayloadSource::WholeText));
    }
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end < start {
        return None;
    }
    Some((&raw[start..=end], PayloadSource::BracketSpan))
}

/// Locates and parses the JSON payload embedded in a model response.
///
/// Blank input is [`ExtractError::Empty`]; anything else that yields no
/// parseable candidate is [`ExtractError::NoArray`] or [`ExtractError::Syntax`].
pub fn extract_payload(raw: &str) -> Result<Value, ExtractError> {
    if raw.trim().is_empty() {
        return Err(ExtractError::Empty);
    }
    let (candidate, source) = locate_payload(raw).ok_or(ExtractError::NoArray)?;
    debug!(source = source.as_str(), len = candidate.len(), "located payload");
    Ok(serde_json::from_str(candidate)?)
}
