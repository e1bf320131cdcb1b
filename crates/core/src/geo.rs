use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Map center used when no reference location is known.
pub const NYC: Position = Position {
    lat: 40.7128,
    lng: -74.0060,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Parses `"LAT,LNG"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (lat, lng) = raw.split_once(',')?;
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;
        let position = Self { lat, lng };
        position.in_range().then_some(position)
    }

    pub fn in_range(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn distance_miles(&self, other: &Position) -> f64 {
        haversine_miles(*self, *other)
    }
}

pub fn haversine_miles(from: Position, to: Position) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}
