//! Nearby command: load the SDK, locate the driver, list stations

use anyhow::Result;
use owo_colors::OwoColorize;
use std::sync::Arc;
use truckstop_cli::output::{format_count, format_duration, Status};
use truckstop_cli::{progress, stations};
use truckstop_core::config::Config;
use truckstop_core::{Error as CoreError, ResultExt};
use truckstop_maps::{LocationProvider, MapRegion, NearbyFinder, ScriptLoader};
use truckstop_places::{HttpSdkHost, PlacesConfig};
use truckstop_telemetry::Timer;

/// Runs the full finder flow once against the maps web services.
pub async fn run(
    config: Config,
    position: Option<(f64, f64)>,
    region: &str,
    json: bool,
) -> Result<()> {
    let mut schema = config.schema;
    if let Some((lat, lng)) = position {
        schema.geolocation.latitude = Some(lat);
        schema.geolocation.longitude = Some(lng);
        schema.validate().context("Position given with --lat/--lng")?;
    }

    let host = HttpSdkHost::new(PlacesConfig::from(&schema.maps)).map_err(CoreError::from)?;
    let loader = ScriptLoader::new(Arc::new(host), &schema.maps);
    let finder = NearbyFinder::new(loader, LocationProvider::from_config(&schema), &schema);
    let region = MapRegion::new(region);

    let pb = if json {
        progress::hidden()
    } else {
        progress::spinner("Loading maps...")
    };

    let timer = Timer::start("load");
    let load = finder.start().await;
    timer.stop();
    if load.error.is_some() {
        progress::finish_error(&pb, "Maps unavailable");
        return Err(failure(&finder));
    }

    pb.set_message("Finding gas stations nearby...");
    let timer = Timer::start("locate_and_search");
    let snapshot = finder.locate_and_search(&region).await;
    let elapsed = timer.stop();

    let failed = snapshot.error.is_some() || snapshot.map_error.is_some();
    let error = failed.then(|| failure(&finder));

    if json {
        let report = error
            .as_ref()
            .and_then(|e| e.downcast_ref::<CoreError>())
            .map(CoreError::to_report);
        let output = serde_json::json!({ "snapshot": snapshot, "error": report });
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    if let Some(e) = error {
        progress::finish_error(&pb, "Search failed");
        return Err(e);
    }

    progress::finish_success(
        &pb,
        &format!(
            "Found {} in {}",
            format_count(snapshot.stations.len(), "station", "stations"),
            format_duration(elapsed)
        ),
    );

    if !json {
        if let Some(here) = snapshot.user_location {
            Status::header("Gas stations nearby");
            println!("{}", format!("Around {here}").dimmed());
            println!();
        }
        stations::print_stations(&snapshot.stations);
    }

    Ok(())
}

/// The last recorded failure as a coded error, so the exit code reflects
/// the stage that failed.
fn failure(finder: &NearbyFinder) -> anyhow::Error {
    match finder.last_failure() {
        Some(e) => CoreError::from(e).into(),
        None => anyhow::anyhow!("Nearby search failed"),
    }
}
