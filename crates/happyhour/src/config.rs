use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use happyhour_finder::{SearchSettings, DEFAULT_QUERY};
use happyhour_llm::LlmProvider;
use serde::Deserialize;

use crate::logging::parse_bool;

pub const DEFAULT_CONFIG_FILE: &str = "happyhour.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct HappyHourConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub default_query: String,
    pub settings: SearchSettings,
}

impl Default for HappyHourConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            model: LlmProvider::Gemini.default_model().to_string(),
            default_query: DEFAULT_QUERY.to_string(),
            settings: SearchSettings::default(),
        }
    }
}

/// Values given on the command line. `None` leaves the lower layers in charge.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub streaming: Option<bool>,
    pub grounded_search: Option<bool>,
    pub structured_output: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub search: SearchSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct ModelSection {
    pub provider: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchSection {
    pub default_query: Option<String>,
    pub stream: Option<bool>,
    pub grounded: Option<bool>,
    pub structured: Option<bool>,
}

impl HappyHourConfig {
    /// Resolves the configuration: CLI over environment over file over defaults.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let file = match path {
            Some(path) => read_file_config(path)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    read_file_config(&default_path)?
                } else {
                    FileConfig::default()
                }
            }
        };
        Self::layered(file, overrides, |key| env::var(key).ok())
    }

    fn layered(
        file: FileConfig,
        overrides: &Overrides,
        env_var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let provider_name = overrides
            .provider
            .clone()
            .or_else(|| env_var("HAPPYHOUR_PROVIDER"))
            .or(file.model.provider)
            .unwrap_or_else(|| "gemini".to_string());
        let provider = LlmProvider::from_str(&provider_name)
            .ok_or_else(|| anyhow!("unknown provider {provider_name}"))?;
        let model = overrides
            .model
            .clone()
            .or_else(|| env_var("HAPPYHOUR_MODEL"))
            .or(file.model.name)
            .unwrap_or_else(|| provider.default_model().to_string());
        let default_query = env_var("HAPPYHOUR_DEFAULT_QUERY")
            .or(file.search.default_query)
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| DEFAULT_QUERY.to_string());

        let defaults = SearchSettings::default();
        let flag = |cli: Option<bool>, key: &str, file: Option<bool>, fallback: bool| {
            cli.or_else(|| env_var(key).map(|v| parse_bool(&v)))
                .or(file)
                .unwrap_or(fallback)
        };
        let settings = SearchSettings {
            grounded_search: flag(
                overrides.grounded_search,
                "HAPPYHOUR_GROUNDED",
                file.search.grounded,
                defaults.grounded_search,
            ),
            streaming: flag(
                overrides.streaming,
                "HAPPYHOUR_STREAM",
                file.search.stream,
                defaults.streaming,
            ),
            structured_output: flag(
                overrides.structured_output,
                "HAPPYHOUR_STRUCTURED",
                file.search.structured,
                defaults.structured_output,
            ),
        };
        if settings.grounded_search && settings.structured_output {
            tracing::warn!("structured output is ignored while grounded search is on");
        }
        Ok(Self {
            provider,
            model,
            default_query,
            settings,
        })
    }
}

pub fn read_file_config(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&contents).map_err(|e| anyhow!("invalid config {}: {e}", path.display()))
}
