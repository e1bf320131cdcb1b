use chrono::Weekday;
use serde_json::{json, Value};

use crate::filters::{weekday_name, Filters};

/// How the prompt tells the service what shape to answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptStyle {
    /// Describe the JSON array and its keys in the prompt text.
    #[default]
    InlineShape,
    /// Rely on [`venue_response_schema`] passed alongside the prompt.
    Schema,
}

const INLINE_SHAPE_INSTRUCTIONS: &str = "The entire response MUST be a single, valid JSON array of objects. Do not include any text, explanation, or markdown formatting before or after the JSON array. Each object in the array must have the following keys: \"name\" (string), \"address\" (string), \"details\" (string), \"website\" (string), \"cuisine\" (string), \"price_range\" (string), \"latitude\" (number), and \"longitude\" (number).";

const SCHEMA_INSTRUCTIONS: &str = "Respond using the provided response schema. Put each distinct deal in its own short entry in \"details\", and give coordinates as decimal degrees.";

pub fn build_prompt(query: &str, filters: &Filters, today: Weekday, style: PromptStyle) -> String {
    let day = weekday_name(filters.day.resolve(today));
    let mut prompt = format!(
        "Find up-to-date happy hour specials for bars and restaurants in {}. ",
        query.trim()
    );
    prompt.push_str(&format!(
        "The current day is {day}. Focus on specials available on {day}. "
    ));
    if !filters.cuisines.is_empty() {
        prompt.push_str(&format!(
            "Only include places serving any of the following cuisines: {}. ",
            filters.cuisines.join(", ")
        ));
    }
    if !filters.prices.is_empty() {
        let prices = filters
            .prices
            .iter()
            .map(|tier| tier.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        prompt.push_str(&format!(
            "Only include places in any of the following price ranges: {prices}. "
        ));
    }
    if !filters.special_types.is_empty() {
        let kinds = filters
            .special_types
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        prompt.push_str(&format!(
            "Only include the following types of specials: {kinds}. "
        ));
    }
    prompt.push_str("Check bar and restaurant websites, menus, and food media such as Eater.com to find the most current information. ");
    prompt.push_str("Return a list of the top 5-10 places. ");
    match style {
        PromptStyle::InlineShape => prompt.push_str(INLINE_SHAPE_INSTRUCTIONS),
        PromptStyle::Schema => prompt.push_str(SCHEMA_INSTRUCTIONS),
    }
    prompt
}

/// Structured-output schema for the venue list, in the service's OpenAPI subset.
pub fn venue_response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "address": { "type": "STRING" },
                "details": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                },
                "website": { "type": "STRING" },
                "cuisine": { "type": "STRING" },
                "price_range": { "type": "STRING" },
                "latitude": { "type": "NUMBER" },
                "longitude": { "type": "NUMBER" }
            },
            "required": [
                "name", "address", "details", "cuisine", "price_range", "latitude", "longitude"
            ]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{DayFilter, PriceTier, SpecialType};

    #[test]
    fn default_filters_only_mention_query_and_day() {
        let prompt = build_prompt(
            " Austin, TX ",
            &Filters::default(),
            Weekday::Thu,
            PromptStyle::InlineShape,
        );
        assert!(prompt.contains("restaurants in Austin, TX. "));
        assert!(prompt.contains("Focus on specials available on Thursday."));
        assert!(!prompt.contains("cuisines"));
        assert!(!prompt.contains("price ranges"));
        assert!(!prompt.contains("types of specials"));
        assert!(prompt.contains("\"latitude\" (number)"));
    }

    #[test]
    fn embeds_every_selected_filter() {
        let filters = Filters::new(
            vec!["Italian".to_string(), "Thai".to_string()],
            vec![PriceTier::One, PriceTier::Three],
            DayFilter::On(Weekday::Sat),
            vec![SpecialType::Drinks, SpecialType::LateNight],
        );
        let prompt = build_prompt("Chicago", &filters, Weekday::Mon, PromptStyle::Schema);
        assert!(prompt.contains("The current day is Saturday."));
        assert!(prompt.contains("cuisines: Italian, Thai."));
        assert!(prompt.contains("price ranges: $, $$$."));
        assert!(prompt.contains("types of specials: drinks, late night."));
        assert!(prompt.contains("response schema"));
        assert!(!prompt.contains("\"latitude\" (number)"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let filters = Filters::default();
        let a = build_prompt("Boston", &filters, Weekday::Tue, PromptStyle::InlineShape);
        let b = build_prompt("Boston", &filters, Weekday::Tue, PromptStyle::InlineShape);
        assert_eq!(a, b);
    }

    #[test]
    fn schema_requires_coordinates() {
        let schema = venue_response_schema();
        let required = schema["items"]["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "latitude"));
        assert!(!required.iter().any(|v| v == "website"));
    }
}
