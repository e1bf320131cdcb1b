use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use happyhour_core::{
    dedupe_citations, extract_payload, normalize_venues, sorted_view, Citation, Position,
    SortMode, Venue,
};

proptest! {
    #[test]
    fn recovers_array_wrapped_in_prose(
        prefix in prose(),
        suffix in prose(),
        items in prop::collection::vec(scalar(), 0..8),
    ) {
        let array = Value::Array(items);
        let raw = format!("{prefix}{array}{suffix}");
        let parsed = extract_payload(&raw).expect("payload recovered");
        prop_assert_eq!(&parsed, &array);
        prop_assert_eq!(parsed, extract_payload(&raw).expect("second pass"));
    }

    #[test]
    fn keeps_exactly_the_valid_records(records in prop::collection::vec(record(), 0..16)) {
        let payload = Value::Array(records.iter().map(|r| r.json.clone()).collect());
        let venues = normalize_venues(&payload);
        let expected: Vec<&str> = records
            .iter()
            .filter(|r| r.valid)
            .map(|r| r.name.as_str())
            .collect();
        let names: Vec<&str> = venues.iter().map(|v| v.name.as_str()).collect();
        prop_assert_eq!(names, expected);
        for venue in &venues {
            prop_assert!(venue.position.lat.is_finite() && venue.position.lng.is_finite());
            prop_assert!(!(venue.position.lat == 0.0 && venue.position.lng == 0.0));
        }
    }

    #[test]
    fn identifiers_are_unique(
        name in "[A-Za-z ]{0,6}",
        lat in -89.0f64..89.0,
        lng in 1.0f64..179.0,
        count in 1usize..24,
    ) {
        // Same name and position for every record is the worst case.
        let payload = Value::Array(
            (0..count)
                .map(|_| json!({ "name": name, "latitude": lat, "longitude": lng }))
                .collect(),
        );
        let venues = normalize_venues(&payload);
        prop_assert_eq!(venues.len(), count);
        let ids: HashSet<&str> = venues.iter().map(|v| v.id.as_str()).collect();
        prop_assert_eq!(ids.len(), count);
    }

    #[test]
    fn citations_keep_first_title_per_uri(
        raw in prop::collection::vec(("[a-d]", "[A-Z]{1,4}"), 0..20),
    ) {
        let citations: Vec<Citation> = raw
            .iter()
            .map(|(uri, title)| Citation::new(format!("https://{uri}.example"), title.clone()))
            .collect();
        let sources = dedupe_citations(citations.clone());
        let mut first_seen: HashMap<String, String> = HashMap::new();
        for citation in &citations {
            let uri = citation.uri.clone().unwrap_or_default();
            first_seen
                .entry(uri)
                .or_insert_with(|| citation.title.clone().unwrap_or_default());
        }
        let uris: HashSet<&str> = sources.iter().map(|s| s.uri.as_str()).collect();
        prop_assert_eq!(uris.len(), sources.len());
        prop_assert_eq!(sources.len(), first_seen.len());
        for source in &sources {
            prop_assert_eq!(Some(&source.title), first_seen.get(&source.uri));
        }
    }

    #[test]
    fn distance_sort_orders_known_before_unknown(
        distances in prop::collection::vec(prop::option::of(0.0f64..5000.0), 0..20),
    ) {
        let venues: Vec<Venue> = distances
            .iter()
            .enumerate()
            .map(|(i, d)| venue(i, *d))
            .collect();
        let view = sorted_view(&venues, SortMode::Distance);
        prop_assert_eq!(view.len(), venues.len());
        let known: Vec<f64> = view.iter().filter_map(|v| v.distance).collect();
        prop_assert!(known.windows(2).all(|w| w[0] <= w[1]));
        let first_unknown = view.iter().position(|v| v.distance.is_none());
        if let Some(idx) = first_unknown {
            prop_assert!(view[idx..].iter().all(|v| v.distance.is_none()));
        }
        // Sorting an already sorted view changes nothing.
        let resorted: Vec<Venue> = view.iter().map(|v| (*v).clone()).collect();
        let again = sorted_view(&resorted, SortMode::Distance);
        let a: Vec<&str> = view.iter().map(|v| v.id.as_str()).collect();
        let b: Vec<&str> = again.iter().map(|v| v.id.as_str()).collect();
        prop_assert_eq!(a, b);
    }
}

#[derive(Clone, Debug)]
struct RecordSpec {
    name: String,
    valid: bool,
    json: Value,
}

fn prose() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ,.:;!?'\n-]{0,40}".prop_map(|s| s.to_string())
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        Just(Value::Null),
        ("[a-z]{1,5}", any::<i32>())
            .prop_map(|(k, v)| Value::Object(Map::from_iter([(k, Value::from(v))]))),
    ]
}

fn record() -> impl Strategy<Value = RecordSpec> {
    (
        "[A-Z][a-z]{2,8}",
        prop_oneof![
            3 => (-89.0f64..89.0, -179.0f64..179.0)
                .prop_filter("not null island", |(lat, lng)| *lat != 0.0 || *lng != 0.0)
                .prop_map(|(lat, lng)| Some(Position::new(lat, lng))),
            1 => Just(None),
        ],
        any::<bool>(),
    )
        .prop_map(|(name, position, nested)| {
            let json = match (position, nested) {
                (Some(p), false) => json!({ "name": name, "latitude": p.lat, "longitude": p.lng }),
                (Some(p), true) => json!({ "name": name, "position": { "lat": p.lat, "lng": p.lng } }),
                (None, false) => json!({ "name": name, "latitude": 0, "longitude": 0 }),
                (None, true) => json!({ "name": name, "details": "no coordinates" }),
            };
            RecordSpec {
                name,
                valid: position.is_some(),
                json,
            }
        })
}

fn venue(index: usize, distance: Option<f64>) -> Venue {
    Venue {
        id: format!("v{index}"),
        name: format!("Venue {index}"),
        address: "N/A".into(),
        details: vec![],
        website: None,
        cuisine: "N/A".into(),
        price_range: "N/A".into(),
        position: Position::new(1.0, 1.0),
        distance,
    }
}
