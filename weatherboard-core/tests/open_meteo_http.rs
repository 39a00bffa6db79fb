//! HTTP clients against mocked Open-Meteo and IP-location services.

use std::time::Duration;

use weatherboard_core::{
    FetchError, ForecastSource, Geocoder, LocationError, Locator, OpenMeteoForecast,
    OpenMeteoGeocoder, SearchError, geolocation::IpLocator,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "latitude": 51.5,
        "longitude": -0.12,
        "timezone": "Europe/London",
        "daily_units": { "temperature_2m_max": "°C" },
        "daily": {
            "time": ["2024-12-26", "2024-12-27", "2024-12-28"],
            "weathercode": [3, 61, 95],
            "temperature_2m_max": [7.2, 8.0, 9.5],
            "temperature_2m_min": [1.1, -0.5, 2.0]
        }
    })
}

// =============================================================================
// Geocoding
// =============================================================================

#[tokio::test]
async fn geocoder_sends_name_and_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "London"))
        .and(query_param("count", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                { "id": 2643743, "name": "London", "country": "United Kingdom", "latitude": 51.50853, "longitude": -0.12574 },
                { "id": 6058560, "name": "London", "country": "Canada", "latitude": 42.98339, "longitude": -81.23304 }
            ],
            "generationtime_ms": 0.5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let geocoder = OpenMeteoGeocoder::new(format!("{}/v1", server.uri()), TIMEOUT).expect("client");
    let hits = geocoder.search("London").await.expect("results");

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].index, 0);
    assert_eq!(hits[0].label(), "London, United Kingdom");
    assert_eq!(hits[1].index, 1);
    assert_eq!(hits[1].lat, 42.98339);
}

#[tokio::test]
async fn geocoder_without_results_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "generationtime_ms": 0.2 })),
        )
        .mount(&server)
        .await;

    let geocoder = OpenMeteoGeocoder::new(format!("{}/v1/", server.uri()), TIMEOUT).expect("client");
    assert!(geocoder.search("Qwxz").await.expect("ok").is_empty());
}

#[tokio::test]
async fn geocoder_keeps_at_most_five() {
    let server = MockServer::start().await;
    let many: Vec<_> = (0..8)
        .map(|i| serde_json::json!({ "name": format!("Springfield {i}"), "country": "United States", "latitude": 39.8, "longitude": -89.6 }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": many })))
        .mount(&server)
        .await;

    let geocoder = OpenMeteoGeocoder::new(format!("{}/v1", server.uri()), TIMEOUT).expect("client");
    assert_eq!(geocoder.search("Springfield").await.expect("ok").len(), 5);
}

#[tokio::test]
async fn geocoder_reports_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let geocoder = OpenMeteoGeocoder::new(format!("{}/v1", server.uri()), TIMEOUT).expect("client");
    assert!(matches!(geocoder.search("London").await, Err(SearchError::Status(_))));
}

// =============================================================================
// Forecast
// =============================================================================

#[tokio::test]
async fn forecast_requests_daily_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "51.5"))
        .and(query_param("longitude", "-0.1"))
        .and(query_param("daily", "temperature_2m_max,temperature_2m_min,weathercode"))
        .and(query_param("timezone", "auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;

    let source = OpenMeteoForecast::new(format!("{}/v1", server.uri()), TIMEOUT).expect("client");
    let payload = source.fetch(51.5, -0.1).await.expect("payload");

    assert_eq!(payload.days.len(), 3);
    assert_eq!(payload.days[2].weathercode, 95);
    assert_eq!(payload.days[0].temp_max, 7.2);
}

#[tokio::test]
async fn forecast_http_error_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": true,
            "reason": "Latitude must be in range of -90 to 90°."
        })))
        .mount(&server)
        .await;

    let source = OpenMeteoForecast::new(format!("{}/v1", server.uri()), TIMEOUT).expect("client");
    assert!(matches!(source.fetch(10.0, 10.0).await, Err(FetchError::Status(_))));
}

#[tokio::test]
async fn forecast_without_time_series_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "daily": {
                "weathercode": [3, 61, 95],
                "temperature_2m_max": [7.2, 8.0, 9.5],
                "temperature_2m_min": [1.1, -0.5, 2.0]
            }
        })))
        .mount(&server)
        .await;

    let source = OpenMeteoForecast::new(format!("{}/v1", server.uri()), TIMEOUT).expect("client");
    assert!(matches!(source.fetch(10.0, 10.0).await, Err(FetchError::Payload(_))));
}

#[tokio::test]
async fn forecast_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let source =
        OpenMeteoForecast::new(format!("{}/v1", server.uri()), Duration::from_millis(200)).expect("client");
    assert!(matches!(source.fetch(10.0, 10.0).await, Err(FetchError::Transport(_))));
}

// =============================================================================
// IP location
// =============================================================================

#[tokio::test]
async fn ip_locator_reads_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "country": "Netherlands",
            "city": "Amsterdam",
            "lat": 52.3676,
            "lon": 4.9041
        })))
        .mount(&server)
        .await;

    let locator = IpLocator::new(server.uri(), TIMEOUT).expect("client");
    let coords = locator.locate().await.expect("coords");
    assert_eq!((coords.latitude, coords.longitude), (52.3676, 4.9041));
}

#[tokio::test]
async fn ip_locator_failure_status_is_denial() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "fail",
            "message": "private range"
        })))
        .mount(&server)
        .await;

    let locator = IpLocator::new(server.uri(), TIMEOUT).expect("client");
    assert_eq!(locator.locate().await.unwrap_err(), LocationError::PermissionDenied);
}
