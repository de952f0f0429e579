//! End-to-end tests of the HTTP backend against wiremock.

use std::sync::Arc;
use truckstop_core::config::ConfigSchema;
use truckstop_maps::error::{AUTH_FAILURE, SCRIPT_LOAD_FAILED};
use truckstop_maps::{
    FinderState, LocationProvider, MapRegion, MarkerApi, MarkerKind, NearbyFinder, ScriptLoader,
};
use truckstop_places::{HttpSdkHost, PlacesConfig};
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LAT: f64 = 47.6062;
const LNG: f64 = -122.3321;

fn test_config(server: &MockServer) -> ConfigSchema {
    let mut config = ConfigSchema::default();
    config.maps.api_key = Some("test-key".into());
    config.maps.script_url = format!("{}/maps/api/js", server.uri());
    config.maps.api_base_url = format!("{}/maps/api", server.uri());
    config.geolocation.latitude = Some(LAT);
    config.geolocation.longitude = Some(LNG);
    config
}

fn test_finder(config: &ConfigSchema) -> NearbyFinder {
    let host = HttpSdkHost::new(PlacesConfig::from(&config.maps))
        .expect("host construction should not fail");
    let loader = ScriptLoader::new(Arc::new(host), &config.maps);
    NearbyFinder::new(loader, LocationProvider::from_config(config), config)
}

async fn mount_script(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/maps/api/js"))
        .and(query_param("key", "test-key"))
        .and(query_param("libraries", "places,geometry"))
        .and(query_param("loading", "async"))
        .respond_with(ResponseTemplate::new(200).set_body_string("/* maps loader */"))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_search(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .and(query_param("location", format!("{LAT},{LNG}")))
        .and(query_param("radius", "5000"))
        .and(query_param("type", "gas_station"))
        .and(query_param("key", "test-key"))
        .and(header_exists("X-Request-ID"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn station(i: usize) -> serde_json::Value {
    serde_json::json!({
        "place_id": format!("place-{i}"),
        "name": format!("Truck Stop {i}"),
        "vicinity": format!("{i}00 Pacific Hwy"),
        "geometry": { "location": { "lat": LAT + 0.01 * (i as f64 + 1.0), "lng": LNG } }
    })
}

#[tokio::test]
async fn script_fetch_failure_is_terminal_load_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/api/js"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let finder = test_finder(&config);

    let load = finder.start().await;
    assert_eq!(load.error.as_deref(), Some(SCRIPT_LOAD_FAILED));
    assert!(!finder.can_request_location());

    let snapshot = finder.locate_and_search(&MapRegion::new("nearby-map")).await;
    assert!(snapshot.stations.is_empty());
    assert!(finder.sessions().is_empty());
    assert_eq!(snapshot.map_error.as_deref(), Some(SCRIPT_LOAD_FAILED));
}

#[tokio::test]
async fn full_flow_returns_at_most_five_stations() {
    let server = MockServer::start().await;
    mount_script(&server).await;
    let results: Vec<_> = (0..7).map(station).collect();
    mount_search(&server, serde_json::json!({ "status": "OK", "results": results })).await;

    let config = test_config(&server);
    let finder = test_finder(&config);
    assert!(finder.start().await.is_ready());

    let snapshot = finder.locate_and_search(&MapRegion::new("nearby-map")).await;

    assert_eq!(snapshot.state, FinderState::SearchResults(5));
    assert_eq!(snapshot.stations.len(), 5);
    assert_eq!(snapshot.stations[0].name, "Truck Stop 0");
    assert_eq!(snapshot.stations[0].distance, "1.1 km");
    assert!(snapshot.error.is_none());
    assert_eq!(snapshot.markers.len(), 6);
    assert_eq!(snapshot.markers[0].kind, MarkerKind::SelfLocation);
    assert!(snapshot.markers.iter().all(|m| m.api == MarkerApi::Legacy));
}

#[tokio::test]
async fn zero_results_reports_no_stations() {
    let server = MockServer::start().await;
    mount_script(&server).await;
    mount_search(&server, serde_json::json!({ "status": "ZERO_RESULTS", "results": [] })).await;

    let config = test_config(&server);
    let finder = test_finder(&config);
    finder.start().await;

    let snapshot = finder.locate_and_search(&MapRegion::new("nearby-map")).await;

    assert!(snapshot.stations.is_empty());
    assert_eq!(snapshot.error.as_deref(), Some("Could not find any gas stations nearby"));
    assert_eq!(snapshot.markers.len(), 1);
    assert!(snapshot.map_loaded);
}

#[tokio::test]
async fn request_denied_raises_auth_failure() {
    let server = MockServer::start().await;
    mount_script(&server).await;
    mount_search(
        &server,
        serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "This API project is not authorized to use this API.",
            "results": []
        }),
    )
    .await;

    let config = test_config(&server);
    let finder = test_finder(&config);
    assert!(finder.start().await.is_ready());

    let region = MapRegion::new("nearby-map");
    let snapshot = finder.locate_and_search(&region).await;

    assert_eq!(snapshot.map_error.as_deref(), Some(AUTH_FAILURE));
    assert!(!snapshot.map_loaded);
    assert!(!finder.can_request_location());
    assert_eq!(snapshot.error.as_deref(), Some("Could not find any gas stations nearby"));

    let refreshed = finder.refresh(&region).await;
    assert_eq!(refreshed.error.as_deref(), Some(AUTH_FAILURE));
    let searches = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path().ends_with("nearbysearch/json"))
        .count();
    assert_eq!(searches, 1);
}

#[tokio::test]
async fn http_error_on_search_is_no_results() {
    let server = MockServer::start().await;
    mount_script(&server).await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .mount(&server)
        .await;

    let config = test_config(&server);
    let finder = test_finder(&config);
    finder.start().await;

    let snapshot = finder.locate_and_search(&MapRegion::new("nearby-map")).await;

    assert_eq!(snapshot.error.as_deref(), Some("Could not find any gas stations nearby"));
    assert!(snapshot.map_loaded);
}

#[tokio::test]
async fn map_id_enables_advanced_markers() {
    let server = MockServer::start().await;
    mount_script(&server).await;
    mount_search(&server, serde_json::json!({ "status": "OK", "results": [station(0)] })).await;

    let mut config = test_config(&server);
    config.maps.map_id = Some("DEMO_MAP_ID".into());
    let finder = test_finder(&config);
    finder.start().await;

    let snapshot = finder.locate_and_search(&MapRegion::new("nearby-map")).await;

    assert_eq!(snapshot.markers.len(), 2);
    assert!(snapshot.markers.iter().all(|m| m.api == MarkerApi::Advanced));
}

#[tokio::test]
async fn missing_api_key_is_rejected_up_front() {
    let config = ConfigSchema::default();
    let err = HttpSdkHost::new(PlacesConfig::from(&config.maps)).err();
    assert!(matches!(err, Some(truckstop_places::PlacesError::MissingApiKey)));
}
