use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::{Citation, GenerateOptions};

pub(crate) fn build_payload(prompt: &str, options: &GenerateOptions) -> Value {
    let mut payload = json!({
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": prompt }]
            }
        ]
    });
    if options.grounded_search {
        payload["tools"] = json!([{ "google_search": {} }]);
        if options.response_schema.is_some() {
            warn!("response schema is not supported with grounded search, omitting it");
        }
    } else if let Some(schema) = &options.response_schema {
        payload["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
        });
    }
    payload
}

/// One response body, or one streamed chunk of it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiUsage {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
}

impl GeminiResponse {
    /// Concatenated answer text of the first candidate, skipping thought parts.
    pub(crate) fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    pub(crate) fn citations(&self) -> Vec<Citation> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .map(|web| Citation {
                        uri: web.uri.clone(),
                        title: web.title.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn usage(&self) -> Option<GeminiUsage> {
        self.usage_metadata
    }
}

/// Splits a server-sent-event byte stream into `data:` payloads.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(data) = data_line(&line) {
                events.push(data);
            }
        }
        events
    }

    pub(crate) fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        data_line(&line)
    }
}

fn data_line(line: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(line);
    let data = text.trim_end_matches(['\r', '\n']).strip_prefix("data:")?;
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        None
    } else {
        Some(data.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grounding_wins_over_schema() {
        let options = GenerateOptions {
            response_schema: Some(json!({"type": "ARRAY"})),
            grounded_search: true,
            streaming: false,
        };
        let payload = build_payload("hi", &options);
        assert!(payload.get("tools").is_some());
        assert!(payload.get("generationConfig").is_none());
        assert_eq!(payload["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn schema_sets_json_mime_type() {
        let options = GenerateOptions {
            response_schema: Some(json!({"type": "ARRAY"})),
            grounded_search: false,
            streaming: false,
        };
        let payload = build_payload("hi", &options);
        assert_eq!(
            payload["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(payload.get("tools").is_none());
    }

    #[test]
    fn parses_text_citations_and_usage() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "thinking", "thought": true },
                    { "text": "[{\"name\":" },
                    { "text": "\"A\"}]" }
                ]},
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "uri": "https://a.example", "title": "A" } },
                    { "retrievedContext": {} }
                ]}
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 30 }
        });
        let response: GeminiResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.text(), "[{\"name\":\"A\"}]");
        assert_eq!(
            response.citations(),
            vec![Citation {
                uri: Some("https://a.example".into()),
                title: Some("A".into())
            }]
        );
        assert_eq!(response.usage().unwrap().candidates_token_count, Some(30));
    }

    #[test]
    fn empty_candidates_yield_empty_text() {
        let response: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.text(), "");
        assert!(response.citations().is_empty());
    }

    #[test]
    fn sse_decoder_handles_split_chunks() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        let events = decoder.push(b": 1}\r\n\r\ndata: {\"b\": 2}\n: comment\n");
        assert_eq!(events, vec!["{\"a\": 1}", "{\"b\": 2}"]);
        decoder.push(b"data: [DONE]\n");
        decoder.push(b"data: {\"tail\": true}");
        assert_eq!(decoder.finish().as_deref(), Some("{\"tail\": true}"));
        assert_eq!(decoder.finish(), None);
    }
}
