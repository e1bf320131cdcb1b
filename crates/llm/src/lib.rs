mod gemini;

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header::HeaderValue, Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::gemini::{build_payload, GeminiResponse, SseDecoder};

pub use happyhour_core::Citation;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const MAX_RETRIES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    Local,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "gemini",
            LlmProvider::Local => "local",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "gemini" => Some(LlmProvider::Gemini),
            "local" => Some(LlmProvider::Local),
            _ => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "gemini-2.5-flash",
            LlmProvider::Local => "local",
        }
    }
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("{0} is not set")]
    MissingApiKey(String),
    #[error("{0}")]
    InvalidApiKey(String),
    #[error("{0}")]
    Transport(String),
}

impl LlmError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, LlmError::MissingApiKey(_) | LlmError::InvalidApiKey(_))
    }
}

impl From<anyhow::Error> for LlmError {
    fn from(value: anyhow::Error) -> Self {
        Self::Transport(format!("{value:#}"))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Structured-output schema. Ignored when `grounded_search` is set.
    pub response_schema: Option<Value>,
    pub grounded_search: bool,
    pub streaming: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Generation {
    /// Full response text. When fragments were emitted this is their concatenation.
    pub text: String,
    pub citations: Vec<Citation>,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Generation {
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// Something that turns a prompt into text.
///
/// Streaming implementations call `on_fragment` for every piece of text as it
/// arrives; one-shot implementations never call it.
#[async_trait]
pub trait GenerationCapability: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
        on_fragment: &mut (dyn for<'f> FnMut(&'f str) + Send),
    ) -> Result<Generation, LlmError>;
}

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    provider: LlmProvider,
    model: String,
    config: ProviderConfig,
}

#[derive(Clone)]
enum ProviderConfig {
    Gemini(GeminiConfig),
    Local(LocalConfig),
}

#[derive(Clone)]
struct GeminiConfig {
    api_key: SecretString,
    base_url: String,
}

#[derive(Clone)]
struct LocalConfig {
    response_path: Option<PathBuf>,
}

impl LlmClient {
    pub fn new(provider: LlmProvider, model: impl Into<String>) -> Result<Self, LlmError> {
        let model = model.into();
        let http = Client::new();
        let config = match provider {
            LlmProvider::Gemini => ProviderConfig::Gemini(GeminiConfig {
                api_key: read_api_key(&["GEMINI_API_KEY", "API_KEY"])?,
                base_url: env::var("GEMINI_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            }),
            LlmProvider::Local => ProviderConfig::Local(LocalConfig {
                response_path: env::var_os("HAPPYHOUR_LOCAL_RESPONSE").map(PathBuf::from),
            }),
        };
        Ok(Self {
            http,
            provider,
            model,
            config,
        })
    }

    /// A local client that replays the given file instead of reading the environment.
    pub fn local_replay(path: impl Into<PathBuf>) -> Self {
        Self {
            http: Client::new(),
            provider: LlmProvider::Local,
            model: LlmProvider::Local.default_model().to_string(),
            config: ProviderConfig::Local(LocalConfig {
                response_path: Some(path.into()),
            }),
        }
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate_gemini(
        &self,
        cfg: &GeminiConfig,
        prompt: &str,
        options: &GenerateOptions,
        on_fragment: &mut (dyn for<'f> FnMut(&'f str) + Send),
    ) -> anyhow::Result<Generation> {
        let payload = build_payload(prompt, options);
        let base = cfg.base_url.trim_end_matches('/');
        let url = if options.streaming {
            format!("{base}/models/{}:streamGenerateContent?alt=sse", self.model)
        } else {
            format!("{base}/models/{}:generateContent", self.model)
        };
        let response = self.send_with_retry(cfg, &url, &payload).await?;
        if options.streaming {
            read_stream(response, on_fragment).await
        } else {
            let body = decode_gemini_body(response).await?;
            let usage = body.usage().unwrap_or_default();
            Ok(Generation {
                text: body.text(),
                citations: body.citations(),
                prompt_tokens: usage.prompt_token_count.unwrap_or(0),
                completion_tokens: usage.candidates_token_count.unwrap_or(0),
            })
        }
    }

    async fn send_with_retry(
        &self,
        cfg: &GeminiConfig,
        url: &str,
        payload: &Value,
    ) -> anyhow::Result<Response> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let response = match self
                .http
                .post(url)
                .header("x-goog-api-key", cfg.api_key.expose_secret().as_str())
                .json(payload)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(err) => {
                    if attempt > MAX_RETRIES {
                        return Err(err).context("gemini request failed");
                    }
                    warn!(attempt, error = %err, "gemini request failed, retrying");
                    sleep(backoff_delay(attempt, None)).await;
                    continue;
                }
            };
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                if attempt > MAX_RETRIES {
                    return Err(anyhow!("gemini rate limited after {MAX_RETRIES} retries"));
                }
                let wait = backoff_delay(attempt, response.headers().get("retry-after"));
                warn!(attempt, wait_secs = wait.as_secs(), "gemini rate limited");
                sleep(wait).await;
                continue;
            }
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(anyhow!("gemini returned error (status {status}): {body}"));
            }
            return Ok(response);
        }
    }

    async fn generate_local(
        &self,
        cfg: &LocalConfig,
        options: &GenerateOptions,
        on_fragment: &mut (dyn for<'f> FnMut(&'f str) + Send),
    ) -> anyhow::Result<Generation> {
        let text = match &cfg.response_path {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?,
            None => "[]".to_string(),
        };
        if options.streaming {
            for line in text.split_inclusive('\n') {
                on_fragment(line);
            }
        }
        Ok(Generation {
            text,
            ..Generation::default()
        })
    }
}

#[async_trait]
impl GenerationCapability for LlmClient {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
        on_fragment: &mut (dyn for<'f> FnMut(&'f str) + Send),
    ) -> Result<Generation, LlmError> {
        debug!(
            provider = self.provider.as_str(),
            model = %self.model,
            streaming = options.streaming,
            grounded = options.grounded_search,
            "generating"
        );
        let result = match &self.config {
            ProviderConfig::Gemini(cfg) => {
                self.generate_gemini(cfg, prompt, options, on_fragment).await
            }
            ProviderConfig::Local(cfg) => self.generate_local(cfg, options, on_fragment).await,
        };
        Ok(result?)
    }
}

async fn decode_gemini_body(response: Response) -> anyhow::Result<GeminiResponse> {
    let body = response
        .text()
        .await
        .context("failed to read gemini response")?;
    serde_json::from_str(&body).context("failed to decode gemini response")
}

async fn read_stream(
    response: Response,
    on_fragment: &mut (dyn for<'f> FnMut(&'f str) + Send),
) -> anyhow::Result<Generation> {
    let mut generation = Generation::default();
    let mut decoder = SseDecoder::default();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("gemini stream interrupted")?;
        for event in decoder.push(&chunk) {
            apply_stream_event(&event, &mut generation, on_fragment)?;
        }
    }
    if let Some(event) = decoder.finish() {
        apply_stream_event(&event, &mut generation, on_fragment)?;
    }
    Ok(generation)
}

fn apply_stream_event(
    event: &str,
    generation: &mut Generation,
    on_fragment: &mut (dyn for<'f> FnMut(&'f str) + Send),
) -> anyhow::Result<()> {
    let chunk: GeminiResponse =
        serde_json::from_str(event).context("failed to decode gemini stream chunk")?;
    let text = chunk.text();
    if !text.is_empty() {
        on_fragment(&text);
        generation.text.push_str(&text);
    }
    generation.citations.extend(chunk.citations());
    if let Some(usage) = chunk.usage() {
        generation.prompt_tokens = usage.prompt_token_count.unwrap_or(generation.prompt_tokens);
        generation.completion_tokens = usage
            .candidates_token_count
            .unwrap_or(generation.completion_tokens);
    }
    Ok(())
}

fn backoff_delay(attempt: usize, retry_after: Option<&HeaderValue>) -> Duration {
    if let Some(value) = retry_after {
        if let Ok(text) = value.to_str() {
            if let Ok(secs) = text.parse::<u64>() {
                return Duration::from_secs(secs.max(1));
            }
        }
    }
    let capped = attempt.min(6) as u32;
    Duration::from_secs(1u64 << capped)
}

fn read_api_key(vars: &[&str]) -> Result<SecretString, LlmError> {
    let (var, value) = vars
        .iter()
        .find_map(|var| {
            env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| (*var, v))
        })
        .ok_or_else(|| LlmError::MissingApiKey(vars.join(" or ")))?;
    validate_api_key(var, &value)?;
    Ok(SecretString::new(value))
}

fn validate_api_key(var: &str, value: &str) -> Result<(), LlmError> {
    if !value.trim().starts_with("AI") {
        return Err(LlmError::InvalidApiKey(format!(
            "{var} must be a valid Gemini API key (starts with 'AI...')"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn provider_names_roundtrip() {
        for provider in [LlmProvider::Gemini, LlmProvider::Local] {
            assert_eq!(LlmProvider::from_str(provider.as_str()), Some(provider));
        }
        assert_eq!(LlmProvider::from_str("GEMINI"), Some(LlmProvider::Gemini));
        assert_eq!(LlmProvider::from_str("openai"), None);
    }

    #[test]
    fn api_key_prefix_is_checked() {
        let err = validate_api_key("GEMINI_API_KEY", "sk-123").unwrap_err();
        assert!(err.is_configuration());
        assert!(validate_api_key("GEMINI_API_KEY", "AIzaSy123").is_ok());
    }

    #[test]
    fn transport_errors_are_not_configuration() {
        let err = LlmError::from(anyhow!("connection reset"));
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn backoff_honours_retry_after() {
        let header = HeaderValue::from_static("7");
        assert_eq!(backoff_delay(1, Some(&header)), Duration::from_secs(7));
        assert_eq!(backoff_delay(2, None), Duration::from_secs(4));
        assert_eq!(backoff_delay(20, None), Duration::from_secs(64));
    }

    #[test]
    fn stream_events_accumulate_text_and_citations() {
        let mut generation = Generation::default();
        let mut fragments = Vec::new();
        let mut collect = |f: &str| fragments.push(f.to_string());
        apply_stream_event(
            r#"{"candidates":[{"content":{"parts":[{"text":"[{\"a\""}]}}]}"#,
            &mut generation,
            &mut collect,
        )
        .unwrap();
        apply_stream_event(
            r#"{"candidates":[{"content":{"parts":[{"text":":1}]"}]},"groundingMetadata":{"groundingChunks":[{"web":{"uri":"u","title":"t"}}]}}],"usageMetadata":{"promptTokenCount":3,"candidatesTokenCount":5}}"#,
            &mut generation,
            &mut collect,
        )
        .unwrap();
        assert!(apply_stream_event("not json", &mut generation, &mut collect).is_err());
        assert_eq!(generation.text, "[{\"a\":1}]");
        assert_eq!(generation.citations.len(), 1);
        assert_eq!(generation.total_tokens(), 8);
        assert_eq!(fragments, vec!["[{\"a\"", ":1}]"]);
    }

    #[tokio::test]
    async fn local_replay_streams_file_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[\n{{\"name\": \"A\"}}\n]").unwrap();
        let client = LlmClient::local_replay(file.path());
        let mut fragments = Vec::new();
        let options = GenerateOptions {
            streaming: true,
            ..GenerateOptions::default()
        };
        let generation = client
            .generate("ignored", &options, &mut |f: &str| fragments.push(f.to_string()))
            .await
            .unwrap();
        assert_eq!(fragments.concat(), generation.text);
        assert_eq!(fragments.len(), 3);
        assert_eq!(client.provider(), LlmProvider::Local);
    }

    #[tokio::test]
    async fn borrowed_sink_through_trait_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "one\ntwo\n").unwrap();
        let client = LlmClient::local_replay(file.path());
        let capability: &dyn GenerationCapability = &client;
        let options = GenerateOptions {
            streaming: true,
            ..GenerateOptions::default()
        };
        let mut seen = String::new();
        let mut count = 0usize;
        let mut sink = |fragment: &str| {
            seen.push_str(fragment);
            count += 1;
        };
        let generation = capability
            .generate("ignored", &options, &mut sink)
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(seen, generation.text);
        assert!(generation.citations.is_empty());
    }
}
