use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use happyhour_core::{
    canonical_cuisine, DayFilter, PriceTier, SortMode, SpecialType, CUISINE_OPTIONS,
};

#[derive(Parser, Debug)]
#[command(name = "happyhour", about = "Find happy hour specials near you")]
pub struct Cli {
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search for happy hour specials.
    Search(SearchArgs),
    /// Run the extractor and normalizer over a saved raw response (`-` for stdin).
    Extract { input: String },
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Free-text location. Defaults to `--near` or the configured default query.
    pub query: Option<String>,
    #[arg(long = "cuisine", value_parser = parse_cuisine)]
    pub cuisines: Vec<String>,
    #[arg(long = "price", value_parser = parse_price)]
    pub prices: Vec<PriceTier>,
    #[arg(long, value_parser = parse_day)]
    pub day: Option<DayFilter>,
    #[arg(long = "special", value_parser = parse_special)]
    pub specials: Vec<SpecialType>,
    /// Reference location as `LAT,LNG`.
    #[arg(long, allow_hyphen_values = true)]
    pub near: Option<String>,
    #[arg(long, default_value = "relevance", value_parser = parse_sort)]
    pub sort: SortMode,
    #[arg(long, action = ArgAction::SetTrue)]
    pub stream: bool,
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_grounding: bool,
    #[arg(long, action = ArgAction::SetTrue)]
    pub structured: bool,
    #[arg(long)]
    pub provider: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Print the venues as JSON instead of cards.
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,
}

fn parse_cuisine(raw: &str) -> Result<String, String> {
    canonical_cuisine(raw)
        .map(str::to_string)
        .ok_or_else(|| format!("expected one of: {}", CUISINE_OPTIONS.join(", ")))
}

fn parse_price(raw: &str) -> Result<PriceTier, String> {
    PriceTier::from_str(raw).ok_or_else(|| {
        let names: Vec<&str> = PriceTier::ALL.iter().map(PriceTier::as_str).collect();
        format!("expected one of: {}", names.join(", "))
    })
}

fn parse_day(raw: &str) -> Result<DayFilter, String> {
    DayFilter::from_str(raw).ok_or_else(|| {
        let names: Vec<String> = DayFilter::options().iter().map(|d| d.to_string()).collect();
        format!("expected one of: {}", names.join(", "))
    })
}

fn parse_special(raw: &str) -> Result<SpecialType, String> {
    SpecialType::from_str(raw).ok_or_else(|| {
        let names: Vec<&str> = SpecialType::ALL.iter().map(SpecialType::as_str).collect();
        format!("expected one of: {}", names.join(", "))
    })
}

fn parse_sort(raw: &str) -> Result<SortMode, String> {
    SortMode::from_str(raw).ok_or_else(|| "expected relevance or distance".to_string())
}
