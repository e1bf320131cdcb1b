use chrono::Weekday;
use happyhour_core::{
    attach_distances, sorted_view, Filters, Position, SearchError, SortMode, Source, Venue,
    NO_RESULTS_MESSAGE,
};
use happyhour_llm::GenerationCapability;
use tracing::{debug, info};

use crate::location::DEFAULT_QUERY;
use crate::pipeline::{run_search, SearchOutcome, SearchRequest, SearchSettings};
use crate::stream::StreamBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Searching,
    Success,
    Empty,
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Searching => "searching",
            Phase::Success => "success",
            Phase::Empty => "empty",
            Phase::Failed => "failed",
        }
    }
}

/// Issued by [`SearchSession::submit`]; results carrying an older ticket are
/// discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    seq: u64,
}

impl SearchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Published state of one user's search session.
#[derive(Debug, Clone)]
pub struct SearchSession {
    phase: Phase,
    latest_seq: u64,
    active_query: String,
    default_query: String,
    filters: Filters,
    venues: Vec<Venue>,
    sources: Vec<Source>,
    message: Option<String>,
    stream: StreamBuffer,
    location: Option<Position>,
    sort: SortMode,
    selected: Option<String>,
    blocked: Option<SearchError>,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY)
    }
}

impl SearchSession {
    pub fn new(default_query: impl Into<String>) -> Self {
        Self {
            phase: Phase::Idle,
            latest_seq: 0,
            active_query: String::new(),
            default_query: default_query.into(),
            filters: Filters::default(),
            venues: Vec::new(),
            sources: Vec::new(),
            message: None,
            stream: StreamBuffer::default(),
            location: None,
            sort: SortMode::default(),
            selected: None,
            blocked: None,
        }
    }

    /// Starts a new search cycle with the current filters, superseding any
    /// cycle still in flight.
    pub fn submit(&mut self, query: &str) -> Result<SearchTicket, SearchError> {
        if let Some(err) = &self.blocked {
            return Err(err.clone());
        }
        self.latest_seq += 1;
        let query = query.trim();
        self.active_query = if query.is_empty() {
            self.default_query.clone()
        } else {
            query.to_string()
        };
        self.phase = Phase::Searching;
        self.venues.clear();
        self.sources.clear();
        self.message = None;
        self.selected = None;
        self.stream.clear();
        info!(seq = self.latest_seq, query = %self.active_query, "search submitted");
        Ok(SearchTicket {
            seq: self.latest_seq,
        })
    }

    /// The request for the cycle `submit` just started.
    pub fn request(&self, today: Weekday, settings: SearchSettings) -> SearchRequest {
        SearchRequest {
            query: self.active_query.clone(),
            filters: self.filters.clone(),
            today,
            settings,
        }
    }

    /// Appends a streamed fragment. Returns `false` if the ticket is stale.
    pub fn push_fragment(&mut self, ticket: SearchTicket, fragment: &str) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.stream.push(fragment);
        true
    }

    /// Publishes the result of a cycle. Returns `false` and changes nothing
    /// when a newer cycle has been submitted since.
    pub fn resolve(
        &mut self,
        ticket: SearchTicket,
        result: Result<SearchOutcome, SearchError>,
    ) -> bool {
        if !self.is_current(ticket) {
            debug!(
                seq = ticket.seq,
                latest = self.latest_seq,
                "discarding stale result"
            );
            return false;
        }
        match result {
            Ok(outcome) => {
                let mut venues = outcome.venues;
                attach_distances(&mut venues, self.location);
                self.sources = outcome.sources;
                if venues.is_empty() {
                    self.phase = Phase::Empty;
                    self.message = Some(NO_RESULTS_MESSAGE.to_string());
                } else {
                    self.phase = Phase::Success;
                    self.message = None;
                }
                info!(
                    seq = ticket.seq,
                    venues = venues.len(),
                    sources = self.sources.len(),
                    "search resolved"
                );
                self.venues = venues;
            }
            Err(SearchError::EmptyResponse) => {
                self.venues.clear();
                self.phase = Phase::Empty;
                self.message = Some(SearchError::EmptyResponse.user_message().to_string());
            }
            Err(err) => {
                info!(seq = ticket.seq, error = %err, "search failed");
                self.venues.clear();
                self.phase = Phase::Failed;
                self.message = Some(err.user_message().to_string());
                if err.is_fatal() {
                    self.blocked = Some(err);
                }
            }
        }
        true
    }

    /// Runs one full cycle against `capability`.
    pub async fn search(
        &mut self,
        capability: &dyn GenerationCapability,
        query: &str,
        settings: SearchSettings,
        today: Weekday,
    ) -> Phase {
        self.search_with(capability, query, settings, today, &mut |_: &str| {})
            .await
    }

    /// Like [`SearchSession::search`], also forwarding each streamed fragment
    /// to `on_fragment` for progressive display.
    pub async fn search_with(
        &mut self,
        capability: &dyn GenerationCapability,
        query: &str,
        settings: SearchSettings,
        today: Weekday,
        on_fragment: &mut (dyn for<'f> FnMut(&'f str) + Send),
    ) -> Phase {
        let ticket = match self.submit(query) {
            Ok(ticket) => ticket,
            Err(_) => return self.phase,
        };
        let request = self.request(today, settings);
        let stream = &mut self.stream;
        let result = run_search(capability, &request, &mut |fragment: &str| {
            stream.push(fragment);
            on_fragment(fragment);
        })
        .await;
        self.resolve(ticket, result);
        self.phase
    }

    /// Replaces the filter selection and returns the query to run again.
    pub fn change_filters(&mut self, filters: Filters) -> String {
        self.filters = filters;
        if self.active_query.is_empty() {
            self.default_query.clone()
        } else {
            self.active_query.clone()
        }
    }

    /// Records the reference location and refreshes distances of the
    /// current results.
    pub fn set_location(&mut self, location: Option<Position>) {
        self.location = location;
        attach_distances(&mut self.venues, location);
    }

    pub fn set_sort(&mut self, mode: SortMode) {
        self.sort = mode;
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort
    }

    pub fn distance_sort_available(&self) -> bool {
        self.location.is_some()
    }

    /// Venues in presentation order.
    pub fn visible_venues(&self) -> Vec<&Venue> {
        let mode = if self.distance_sort_available() {
            self.sort
        } else {
            SortMode::Relevance
        };
        sorted_view(&self.venues, mode)
    }

    /// Selects a venue by id; unknown ids clear the selection.
    pub fn select(&mut self, id: Option<&str>) {
        self.selected = id
            .filter(|id| self.venues.iter().any(|venue| venue.id == *id))
            .map(str::to_string);
    }

    pub fn selected(&self) -> Option<&Venue> {
        let id = self.selected.as_deref()?;
        self.venues.iter().find(|venue| venue.id == id)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Searching
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.is_some()
    }

    pub fn active_query(&self) -> &str {
        &self.active_query
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn location(&self) -> Option<Position> {
        self.location
    }

    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Raw text streamed so far. For display only.
    pub fn streaming_text(&self) -> String {
        self.stream.text()
    }

    fn is_current(&self, ticket: SearchTicket) -> bool {
        ticket.seq == self.latest_seq
    }
}
