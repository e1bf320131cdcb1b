use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

pub const CUISINE_OPTIONS: [&str; 10] = [
    "American", "Mexican", "Italian", "Japanese", "Chinese", "Indian", "Thai", "French", "Spanish",
    "Greek",
];

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Canonical spelling of a known cuisine label.
pub fn canonical_cuisine(value: &str) -> Option<&'static str> {
    let needle = value.trim();
    CUISINE_OPTIONS
        .iter()
        .copied()
        .find(|option| option.eq_ignore_ascii_case(needle))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceTier {
    #[serde(rename = "$")]
    One,
    #[serde(rename = "$$")]
    Two,
    #[serde(rename = "$$$")]
    Three,
    #[serde(rename = "$$$$")]
    Four,
}

impl PriceTier {
    pub const ALL: [PriceTier; 4] = [
        PriceTier::One,
        PriceTier::Two,
        PriceTier::Three,
        PriceTier::Four,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::One => "$",
            PriceTier::Two => "$$",
            PriceTier::Three => "$$$",
            PriceTier::Four => "$$$$",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim() {
            "$" | "1" => Some(PriceTier::One),
            "$$" | "2" => Some(PriceTier::Two),
            "$$$" | "3" => Some(PriceTier::Three),
            "$$$$" | "4" => Some(PriceTier::Four),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialType {
    Drinks,
    Food,
    LateNight,
}

impl SpecialType {
    pub const ALL: [SpecialType; 3] = [
        SpecialType::Drinks,
        SpecialType::Food,
        SpecialType::LateNight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialType::Drinks => "drinks",
            SpecialType::Food => "food",
            SpecialType::LateNight => "late night",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "drinks" | "drink" => Some(SpecialType::Drinks),
            "food" => Some(SpecialType::Food),
            "late night" | "latenight" => Some(SpecialType::LateNight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DayFilter {
    #[default]
    Today,
    On(Weekday),
}

impl DayFilter {
    pub fn from_str(value: &str) -> Option<Self> {
        let lower = value.trim().to_lowercase();
        if lower == "today" {
            return Some(DayFilter::Today);
        }
        lower.parse::<Weekday>().ok().map(DayFilter::On)
    }

    /// The concrete weekday this filter refers to, given what day it is now.
    pub fn resolve(&self, today: Weekday) -> Weekday {
        match self {
            DayFilter::Today => today,
            DayFilter::On(day) => *day,
        }
    }

    pub fn options() -> Vec<DayFilter> {
        std::iter::once(DayFilter::Today)
            .chain(WEEKDAYS.iter().copied().map(DayFilter::On))
            .collect()
    }
}

impl fmt::Display for DayFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayFilter::Today => f.write_str("Today"),
            DayFilter::On(day) => f.write_str(weekday_name(*day)),
        }
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// The user's filter selection. Replaced wholesale on every change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub prices: Vec<PriceTier>,
    #[serde(default)]
    pub day: DayFilter,
    #[serde(default)]
    pub special_types: Vec<SpecialType>,
}

impl Filters {
    pub fn new(
        cuisines: impl IntoIterator<Item = String>,
        prices: impl IntoIterator<Item = PriceTier>,
        day: DayFilter,
        special_types: impl IntoIterator<Item = SpecialType>,
    ) -> Self {
        Self {
            cuisines: dedup(cuisines),
            prices: dedup(prices),
            day,
            special_types: dedup(special_types),
        }
    }
}

fn dedup<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
