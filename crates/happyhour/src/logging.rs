use std::env;

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    if verbose {
        tracing::info!("verbose logging enabled");
    }
}

pub fn env_flag() -> bool {
    env::var("HAPPYHOUR_VERBOSE")
        .map(|value| parse_bool(value.trim()))
        .unwrap_or(false)
}

pub(crate) fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_truthy_values() {
        for raw in ["1", "true", "YES", " on "] {
            assert!(parse_bool(raw), "{raw}");
        }
        for raw in ["0", "false", "off", "", "maybe"] {
            assert!(!parse_bool(raw), "{raw}");
        }
    }
}
