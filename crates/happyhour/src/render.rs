use std::fmt::Write;

use chrono::Weekday;
use happyhour_core::{format_distance, weekday_name, Filters, Source, Venue};

pub fn venue_card(venue: &Venue) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", venue.name);
    if let Some(miles) = venue.distance {
        let _ = writeln!(out, "  {}", format_distance(miles));
    }
    let _ = writeln!(out, "  {}", venue.address);
    let _ = writeln!(out, "  {} · {}", venue.cuisine, venue.price_range);
    for line in &venue.details {
        let _ = writeln!(out, "  • {line}");
    }
    if let Some(website) = &venue.website {
        let _ = writeln!(out, "  {website}");
    }
    out
}

pub fn venue_cards<'a>(venues: impl IntoIterator<Item = &'a Venue>) -> String {
    venues
        .into_iter()
        .map(venue_card)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn sources_block(sources: &[Source]) -> String {
    if sources.is_empty() {
        return String::new();
    }
    let mut out = String::from("Sources:\n");
    for (idx, source) in sources.iter().enumerate() {
        let _ = writeln!(out, "  {}. {} — {}", idx + 1, source.title, source.uri);
    }
    out
}

/// One-line summary of what was searched for.
pub fn search_header(query: &str, filters: &Filters, today: Weekday) -> String {
    let day = weekday_name(filters.day.resolve(today));
    let mut header = format!("Happy hours near {query} on {day}");
    let mut narrowing = Vec::new();
    if !filters.cuisines.is_empty() {
        narrowing.push(filters.cuisines.join("/"));
    }
    if !filters.prices.is_empty() {
        let prices: Vec<&str> = filters.prices.iter().map(|p| p.as_str()).collect();
        narrowing.push(prices.join("/"));
    }
    if !filters.special_types.is_empty() {
        let kinds: Vec<&str> = filters.special_types.iter().map(|s| s.as_str()).collect();
        narrowing.push(kinds.join("/"));
    }
    if !narrowing.is_empty() {
        let _ = write!(header, " ({})", narrowing.join(", "));
    }
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use happyhour_core::{DayFilter, Position, PriceTier, SpecialType};

    fn venue() -> Venue {
        Venue {
            id: "a-0@40.0000,-74.0000".into(),
            name: "A".into(),
            address: "1 Main".into(),
            details: vec!["$5 beers".into(), "Half-price wings".into()],
            website: None,
            cuisine: "Italian".into(),
            price_range: "$$".into(),
            position: Position::new(40.0, -74.0),
            distance: Some(1.26),
        }
    }

    #[test]
    fn card_lists_every_field() {
        let card = venue_card(&venue());
        assert_eq!(
            card,
            "A\n  1.3 miles away\n  1 Main\n  Italian · $$\n  • $5 beers\n  • Half-price wings\n"
        );
        let mut with_site = venue();
        with_site.distance = None;
        with_site.website = Some("https://a.example".into());
        let card = venue_card(&with_site);
        assert!(!card.contains("miles away"));
        assert!(card.ends_with("  https://a.example\n"));
    }

    #[test]
    fn sources_are_numbered() {
        let sources = vec![
            Source {
                uri: "https://eater.example".into(),
                title: "Eater".into(),
            },
            Source {
                uri: "https://blog.example".into(),
                title: "Blog".into(),
            },
        ];
        assert_eq!(
            sources_block(&sources),
            "Sources:\n  1. Eater — https://eater.example\n  2. Blog — https://blog.example\n"
        );
        assert_eq!(sources_block(&[]), "");
    }

    #[test]
    fn header_resolves_today() {
        let plain = search_header("Austin, TX", &Filters::default(), Weekday::Wed);
        assert_eq!(plain, "Happy hours near Austin, TX on Wednesday");
        let filters = Filters::new(
            vec!["Thai".to_string()],
            vec![PriceTier::One, PriceTier::Two],
            DayFilter::On(Weekday::Sat),
            vec![SpecialType::LateNight],
        );
        assert_eq!(
            search_header("Austin, TX", &filters, Weekday::Wed),
            "Happy hours near Austin, TX on Saturday (Thai, $/$$, late night)"
        );
    }
}
