use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::geo::{haversine_miles, Position};
use crate::venue::Venue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Keep the order the service returned.
    #[default]
    Relevance,
    /// Nearest first; venues without a distance go last.
    Distance,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Relevance => "relevance",
            SortMode::Distance => "distance",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "relevance" => Some(SortMode::Relevance),
            "distance" => Some(SortMode::Distance),
            _ => None,
        }
    }
}

/// Sets `distance` on every venue relative to `origin`, or clears it when no
/// origin is known.
pub fn attach_distances(venues: &mut [Venue], origin: Option<Position>) {
    for venue in venues {
        venue.distance = origin.map(|from| haversine_miles(from, venue.position));
    }
}

/// Presentation order for `venues`. The slice itself is left untouched.
pub fn sorted_view(venues: &[Venue], mode: SortMode) -> Vec<&Venue> {
    let mut view: Vec<&Venue> = venues.iter().collect();
    if mode == SortMode::Distance {
        view.sort_by(|a, b| compare_distance(a.distance, b.distance));
    }
    view
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Display form used on result cards.
pub fn format_distance(miles: f64) -> String {
    format!("{miles:.1} miles away")
}
