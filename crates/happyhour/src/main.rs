mod cli;
mod config;
mod logging;
mod render;

use std::fs;
use std::io::{self, Read, Write};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Local};
use clap::Parser;
use happyhour_core::{
    extract_payload, normalize_venues, Filters, Position, SortMode, CONFIGURATION_MESSAGE,
};
use happyhour_finder::{initial_search, Phase, SearchSession};
use happyhour_llm::LlmClient;
use tracing::{info, warn};

use crate::cli::{Cli, Command, SearchArgs};
use crate::config::{HappyHourConfig, Overrides};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = if cli.verbose {
        true
    } else {
        logging::env_flag()
    };
    logging::init(verbose);
    match cli.command {
        Command::Search(args) => search(args).await,
        Command::Extract { input } => extract(&input),
    }
}

async fn search(args: SearchArgs) -> Result<()> {
    let overrides = Overrides {
        provider: args.provider.clone(),
        model: args.model.clone(),
        streaming: args.stream.then_some(true),
        grounded_search: args.no_grounding.then_some(false),
        structured_output: args.structured.then_some(true),
    };
    let config = HappyHourConfig::load(args.config.as_deref(), &overrides)?;
    let client = LlmClient::new(config.provider, config.model.clone())
        .map_err(|err| anyhow!("{CONFIGURATION_MESSAGE} ({err})"))?;
    info!(
        provider = config.provider.as_str(),
        model = %config.model,
        grounded = config.settings.grounded_search,
        streaming = config.settings.streaming,
        "generation client ready"
    );
    let today = Local::now().weekday();

    let mut session = SearchSession::new(config.default_query.clone());
    let initial = args
        .near
        .as_deref()
        .map(|raw| initial_search(parse_near(raw), &config.default_query));
    if let Some(notice) = initial.as_ref().and_then(|i| i.notice.as_deref()) {
        eprintln!("{notice}");
    }
    session.set_location(initial.as_ref().and_then(|i| i.location));
    let query = match args.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(query) => query.to_string(),
        None => initial
            .map(|i| i.query)
            .unwrap_or_else(|| config.default_query.clone()),
    };

    session.change_filters(Filters::new(
        args.cuisines,
        args.prices,
        args.day.unwrap_or_default(),
        args.specials,
    ));
    session.set_sort(args.sort);
    if session.sort_mode() == SortMode::Distance && !session.distance_sort_available() {
        warn!("distance sort needs --near; showing results in relevance order");
    }

    if !args.json {
        println!("{}\n", render::search_header(&query, session.filters(), today));
    }
    let echo = config.settings.streaming && !args.json;
    let mut stderr = io::stderr();
    let phase = session
        .search_with(&client, &query, config.settings, today, &mut |fragment: &str| {
            if echo {
                let _ = write!(stderr, "{fragment}");
                let _ = stderr.flush();
            }
        })
        .await;
    if echo && !session.streaming_text().is_empty() {
        eprintln!();
    }

    let message = session.message().unwrap_or_default().to_string();
    match phase {
        Phase::Success if args.json => {
            println!("{}", serde_json::to_string_pretty(&session.visible_venues())?);
        }
        Phase::Success => {
            println!("{}", render::venue_cards(session.visible_venues()));
            let sources = render::sources_block(session.sources());
            if !sources.is_empty() {
                println!("{sources}");
            }
        }
        Phase::Empty if args.json => println!("[]"),
        Phase::Empty => println!("{message}"),
        _ => bail!(message),
    }
    Ok(())
}

fn parse_near(raw: &str) -> std::result::Result<Position, String> {
    Position::parse(raw).ok_or_else(|| format!("invalid coordinates '{raw}'"))
}

fn extract(input: &str) -> Result<()> {
    let raw = if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(input).with_context(|| format!("failed to read {input}"))?
    };
    let payload = extract_payload(&raw).context("no venue array found in response")?;
    let venues = normalize_venues(&payload);
    info!(venues = venues.len(), "normalized saved response");
    println!("{}", serde_json::to_string_pretty(&venues)?);
    Ok(())
}
