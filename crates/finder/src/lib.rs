mod location;
mod pipeline;
mod session;
mod stream;

pub use location::{current_location_label, initial_search, InitialSearch, DEFAULT_QUERY};
pub use pipeline::{run_search, SearchOutcome, SearchRequest, SearchSettings};
pub use session::{Phase, SearchSession, SearchTicket};
pub use stream::StreamBuffer;

pub use happyhour_core as core;
pub use happyhour_llm::{
    Generation, GenerateOptions, GenerationCapability, LlmClient, LlmError, LlmProvider,
};
