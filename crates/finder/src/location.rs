use happyhour_core::Position;

pub const DEFAULT_QUERY: &str = "New York, NY";

/// The first search of a session, picked from the geolocation result.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialSearch {
    pub query: String,
    pub location: Option<Position>,
    /// Shown to the user when the location could not be used.
    pub notice: Option<String>,
}

pub fn initial_search(location: Result<Position, String>, default_query: &str) -> InitialSearch {
    match location {
        Ok(position) => InitialSearch {
            query: current_location_label(position),
            location: Some(position),
            notice: None,
        },
        Err(reason) => InitialSearch {
            query: default_query.to_string(),
            location: None,
            notice: Some(format!(
                "Could not get location: {reason}. Searching default location."
            )),
        },
    }
}

pub fn current_location_label(position: Position) -> String {
    format!(
        "my current location ({:.2}, {:.2})",
        position.lat, position.lng
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn located_search_uses_rounded_coordinates() {
        let initial = initial_search(Ok(Position::new(40.71284, -74.00601)), DEFAULT_QUERY);
        assert_eq!(initial.query, "my current location (40.71, -74.01)");
        assert_eq!(initial.notice, None);
        assert!(initial.location.is_some());
    }

    #[test]
    fn failed_location_falls_back_to_default_query() {
        let initial = initial_search(Err("permission denied".into()), DEFAULT_QUERY);
        assert_eq!(initial.query, "New York, NY");
        assert_eq!(initial.location, None);
        assert_eq!(
            initial.notice.as_deref(),
            Some("Could not get location: permission denied. Searching default location.")
        );
    }
}
