mod citations;
mod error;
mod extract;
mod filters;
mod geo;
mod normalization;
mod prompt;
mod ranking;
mod venue;

pub use citations::{dedupe_citations, Citation, Source};
pub use error::{
    ExtractError, RecordRejection, Result, SearchError, CONFIGURATION_MESSAGE,
    NO_RESULTS_MESSAGE, TRANSPORT_MESSAGE, UNREADABLE_MESSAGE,
};
pub use extract::{extract_payload, locate_payload, PayloadSource};
pub use filters::{
    canonical_cuisine, weekday_name, DayFilter, Filters, PriceTier, SpecialType, CUISINE_OPTIONS,
};
pub use geo::{haversine_miles, Position, EARTH_RADIUS_MILES, NYC};
pub use normalization::{coerce_lines, coerce_text, normalize_line};
pub use prompt::{build_prompt, venue_response_schema, PromptStyle};
pub use ranking::{attach_distances, format_distance, sorted_view, SortMode};
pub use venue::{normalize_venues, venue_id, Venue, NOT_AVAILABLE, NO_DETAILS, UNNAMED_PLACE};
