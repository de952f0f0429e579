//! Config command

use anyhow::Result;
use owo_colors::OwoColorize;
use truckstop_cli::output::Status;
use truckstop_core::config::Config;

const REDACTED: &str = "***";

/// Prints the effective configuration with the API key masked.
pub fn run(config: &Config, json: bool) -> Result<()> {
    let mut schema = config.schema.clone();
    if schema.maps.api_key.is_some() {
        schema.maps.api_key = Some(REDACTED.to_string());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    Status::header("truckstop configuration");
    row("file", config.path.as_deref().unwrap_or("(defaults)"));
    row("api key", schema.maps.api_key.as_deref().unwrap_or("(not set)"));
    row("script url", &schema.maps.script_url);
    row("map id", schema.maps.map_id.as_deref().unwrap_or("(none)"));
    row("zoom", &schema.map.zoom.to_string());
    row(
        "search",
        &format!(
            "{} within {} m, up to {} results",
            schema.search.place_type, schema.search.radius_m, schema.search.max_results
        ),
    );
    let position = schema
        .fixed_position()
        .map_or_else(|| "(device)".to_string(), |p| p.to_string());
    row("position", &position);
    row(
        "price band",
        &format!("{:.2} - {:.2}", schema.pricing.min, schema.pricing.max),
    );
    row("log level", &schema.logging.level);
    row(
        "log format",
        if schema.logging.json { "json" } else { "compact" },
    );

    if schema.maps.api_key.is_none() {
        println!();
        Status::warning("No API key set; export TRUCKSTOP_MAPS_API_KEY to search");
    }
    Ok(())
}

fn row(label: &str, value: &str) {
    println!("  {:<12} {}", format!("{label}:").dimmed(), value);
}
