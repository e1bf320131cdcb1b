use thiserror::Error;

pub const NO_RESULTS_MESSAGE: &str = "No happy hour specials found. Try a different search.";
pub const UNREADABLE_MESSAGE: &str =
    "The AI service returned data that could not be read. Please try again.";
pub const TRANSPORT_MESSAGE: &str = "Failed to fetch happy hour data. Please try again.";
pub const CONFIGURATION_MESSAGE: &str =
    "The AI service is not configured. Set GEMINI_API_KEY and restart.";

/// Failure kinds that terminate a search.
///
/// The payload strings are diagnostics for logs. The UI only ever sees
/// [`SearchError::user_message`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("empty response from generation service")]
    EmptyResponse,
    #[error("extraction error: {0}")]
    Extraction(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl SearchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SearchError::Configuration(_) => CONFIGURATION_MESSAGE,
            SearchError::EmptyResponse => NO_RESULTS_MESSAGE,
            SearchError::Extraction(_) => UNREADABLE_MESSAGE,
            SearchError::Transport(_) => TRANSPORT_MESSAGE,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, SearchError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("response contained no text")]
    Empty,
    #[error("no JSON array found in response")]
    NoArray,
    #[error("payload is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
}

impl From<ExtractError> for SearchError {
    fn from(value: ExtractError) -> Self {
        match value {
            ExtractError::Empty => SearchError::EmptyResponse,
            other => SearchError::Extraction(other.to_string()),
        }
    }
}

/// Why a single raw record was dropped during normalization.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordRejection {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("missing {0}")]
    MissingCoordinate(&'static str),
    #[error("{0} is not a finite number")]
    NonFiniteCoordinate(&'static str),
    #[error("position is 0,0")]
    NullIsland,
    #[error("position {lat},{lng} is outside valid ranges")]
    OutOfRange { lat: f64, lng: f64 },
}
