use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::RecordRejection;
use crate::geo::Position;
use crate::normalization::{
    coerce_coordinate, coerce_lines, coerce_text, coerce_text_or, Coordinate,
};

pub const UNNAMED_PLACE: &str = "Unnamed Place";
pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_DETAILS: &str = "No deal details provided.";

/// A normalized venue, safe to hand to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub address: String,
    pub details: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub cuisine: String,
    pub price_range: String,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// Normalizes a parsed payload into venues.
///
/// Bad records are dropped and logged. A payload that is not an array is
/// treated as an empty result.
pub fn normalize_venues(payload: &Value) -> Vec<Venue> {
    let Some(records) = payload.as_array() else {
        warn!(
            kind = json_kind(payload),
            "payload is not an array, treating as no results"
        );
        return Vec::new();
    };
    let mut ids = IdAllocator::default();
    let mut venues = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        match normalize_record(record) {
            Ok(draft) => {
                let id = ids.assign(&draft.name, index, draft.position);
                venues.push(draft.into_venue(id));
            }
            Err(reason) => warn!(index, %reason, "dropping malformed record"),
        }
    }
    venues
}

struct DraftVenue {
    name: String,
    address: String,
    details: Vec<String>,
    website: Option<String>,
    cuisine: String,
    price_range: String,
    position: Position,
}

impl DraftVenue {
    fn into_venue(self, id: String) -> Venue {
        Venue {
            id,
            name: self.name,
            address: self.address,
            details: self.details,
            website: self.website,
            cuisine: self.cuisine,
            price_range: self.price_range,
            position: self.position,
            distance: None,
        }
    }
}

fn normalize_record(record: &Value) -> Result<DraftVenue, RecordRejection> {
    let fields = record.as_object().ok_or(RecordRejection::NotAnObject)?;
    let position = read_position(fields)?;
    let mut details = fields.get("details").map(coerce_lines).unwrap_or_default();
    if details.is_empty() {
        details.push(NO_DETAILS.to_string());
    }
    Ok(DraftVenue {
        name: coerce_text_or(fields.get("name"), UNNAMED_PLACE),
        address: coerce_text_or(fields.get("address"), NOT_AVAILABLE),
        details,
        website: fields
            .get("website")
            .and_then(coerce_text)
            .filter(|site| !is_placeholder(site)),
        cuisine: coerce_text_or(fields.get("cuisine"), NOT_AVAILABLE),
        price_range: coerce_text_or(fields.get("price_range"), NOT_AVAILABLE),
        position,
    })
}

fn read_position(fields: &Map<String, Value>) -> Result<Position, RecordRejection> {
    let nested = fields.get("position").and_then(Value::as_object);
    let lat = first_present([
        fields.get("latitude"),
        fields.get("lat"),
        nested.and_then(|p| p.get("lat")),
        nested.and_then(|p| p.get("latitude")),
    ]);
    let lng = first_present([
        fields.get("longitude"),
        fields.get("lng"),
        nested.and_then(|p| p.get("lng")),
        nested.and_then(|p| p.get("longitude")),
    ]);
    let lat = coordinate(lat, "latitude")?;
    let lng = coordinate(lng, "longitude")?;
    if lat == 0.0 && lng == 0.0 {
        return Err(RecordRejection::NullIsland);
    }
    let position = Position::new(lat, lng);
    if !position.in_range() {
        return Err(RecordRejection::OutOfRange { lat, lng });
    }
    Ok(position)
}

fn first_present<const N: usize>(candidates: [Option<&Value>; N]) -> Option<&Value> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_null())
}

fn coordinate(value: Option<&Value>, axis: &'static str) -> Result<f64, RecordRejection> {
    match coerce_coordinate(value) {
        Coordinate::Value(v) => Ok(v),
        Coordinate::Missing => Err(RecordRejection::MissingCoordinate(axis)),
        Coordinate::Invalid => Err(RecordRejection::NonFiniteCoordinate(axis)),
    }
}

fn is_placeholder(text: &str) -> bool {
    matches!(
        text.to_lowercase().as_str(),
        "n/a" | "na" | "none" | "null" | "unknown" | "-"
    )
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Deterministic identifier: name slug, batch index and rounded position.
pub fn venue_id(name: &str, index: usize, position: Position) -> String {
    format!(
        "{}-{}@{:.4},{:.4}",
        slug(name),
        index,
        position.lat,
        position.lng
    )
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            out.push(ch);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "place".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Default)]
struct IdAllocator {
    seen: HashSet<String>,
}

impl IdAllocator {
    fn assign(&mut self, name: &str, index: usize, position: Position) -> String {
        let base = venue_id(name, index, position);
        let mut id = base.clone();
        while !self.seen.insert(id.clone()) {
            id = format!("{base}-{:08x}", rand::random::<u32>());
        }
        id
    }
}
