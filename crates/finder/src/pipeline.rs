use chrono::Weekday;
use happyhour_core::{
    build_prompt, dedupe_citations, extract_payload, normalize_venues, venue_response_schema,
    Filters, PromptStyle, SearchError, Source, Venue,
};
use happyhour_llm::{GenerateOptions, GenerationCapability, LlmError};
use tracing::{debug, error, warn};

use crate::stream::StreamBuffer;

const RAW_PREVIEW_CHARS: usize = 200;

/// How the generation service is asked to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub grounded_search: bool,
    pub streaming: bool,
    pub structured_output: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            grounded_search: true,
            streaming: false,
            structured_output: false,
        }
    }
}

impl SearchSettings {
    /// The schema is only honoured without grounding, so the prompt has to
    /// describe the shape itself whenever grounding is on.
    pub fn prompt_style(&self) -> PromptStyle {
        if self.structured_output && !self.grounded_search {
            PromptStyle::Schema
        } else {
            PromptStyle::InlineShape
        }
    }

    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            response_schema: (self.prompt_style() == PromptStyle::Schema)
                .then(venue_response_schema),
            grounded_search: self.grounded_search,
            streaming: self.streaming,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub filters: Filters,
    /// Weekday that "today" resolves to.
    pub today: Weekday,
    pub settings: SearchSettings,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub venues: Vec<Venue>,
    pub sources: Vec<Source>,
    pub raw_text: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Prompt, generate, extract, normalize.
///
/// Fragments are forwarded to `on_fragment` as they arrive and are only
/// parsed once the response is complete.
pub async fn run_search(
    capability: &dyn GenerationCapability,
    request: &SearchRequest,
    on_fragment: &mut (dyn for<'f> FnMut(&'f str) + Send),
) -> Result<SearchOutcome, SearchError> {
    let prompt = build_prompt(
        &request.query,
        &request.filters,
        request.today,
        request.settings.prompt_style(),
    );
    let options = request.settings.generate_options();
    let mut buffer = StreamBuffer::default();
    let generation = capability
        .generate(&prompt, &options, &mut |fragment: &str| {
            buffer.push(fragment);
            on_fragment(fragment);
        })
        .await
        .map_err(classify)?;
    if buffer.is_empty() {
        buffer.push(&generation.text);
    }
    let raw_text = buffer.text();
    debug!(
        chars = raw_text.len(),
        fragments = buffer.fragment_count(),
        "response complete"
    );
    let payload = extract_payload(&raw_text).map_err(|err| {
        warn!(error = %err, raw = %preview(&raw_text), "could not extract payload");
        SearchError::from(err)
    })?;
    let venues = normalize_venues(&payload);
    let sources = dedupe_citations(generation.citations);
    Ok(SearchOutcome {
        venues,
        sources,
        raw_text,
        prompt_tokens: generation.prompt_tokens,
        completion_tokens: generation.completion_tokens,
    })
}

fn classify(err: LlmError) -> SearchError {
    if err.is_configuration() {
        error!(error = %err, "generation service is not configured");
        SearchError::Configuration(err.to_string())
    } else {
        error!(error = %err, "generation request failed");
        SearchError::Transport(err.to_string())
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(RAW_PREVIEW_CHARS).collect();
    if text.chars().count() > RAW_PREVIEW_CHARS {
        out.push('…');
    }
    out
}
