use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A grounding reference as reported by the generation service. Either part
/// may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: Option<String>,
    pub title: Option<String>,
}

impl Citation {
    pub fn new(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            title: Some(title.into()),
        }
    }
}

/// A complete, deduplicated citation ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub uri: String,
    pub title: String,
}

/// Drops citations without a uri or title, then keeps the first citation for
/// each uri in first-seen order.
pub fn dedupe_citations(citations: impl IntoIterator<Item = Citation>) -> Vec<Source> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for citation in citations {
        let (Some(uri), Some(title)) = (non_blank(citation.uri), non_blank(citation.title)) else {
            continue;
        };
        if seen.insert(uri.clone()) {
            sources.push(Source { uri, title });
        }
    }
    sources
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
