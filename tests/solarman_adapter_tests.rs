// Solarman adapter against a mocked HTTP surface: token handling, DTO
// mapping, and failure classification.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sungrid::models::VendorCredentials;
use sungrid::vendor::{RetryConfig, SolarmanAdapter, VendorAdapter, VendorError};

fn credentials(api_base: &str) -> VendorCredentials {
    VendorCredentials {
        api_base: api_base.to_string(),
        app_id: "test-app".to_string(),
        app_secret: "test-secret".to_string(),
    }
}

async fn mock_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/account/v1.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "success": true
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn list_plants_maps_station_records() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/station/v1.0/station/list"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "stationList": [
                {
                    "id": 1001,
                    "name": "North Field",
                    "installedCapacity": 240.0,
                    "locationLat": 44.9,
                    "locationLng": 4.9,
                    "locationAddress": "Valence",
                    "generationPower": 180_500.0,
                    "dailyGeneration": 820.0,
                    "totalGeneration": 1_200_000.0,
                    "lastUpdateTime": 1_755_000_000.0
                },
                {
                    "id": 1002
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = SolarmanAdapter::new(credentials(&server.uri())).unwrap();
    let plants = adapter.list_plants().await.unwrap();

    assert_eq!(plants.len(), 2);

    let north = &plants[0];
    assert_eq!(north.external_id, "1001");
    assert_eq!(north.name.as_deref(), Some("North Field"));
    assert_eq!(north.capacity_kw, Some(240.0));
    assert_eq!(north.current_power_kw, Some(180.5));
    assert_eq!(north.energy_today_kwh, Some(820.0));
    assert_eq!(north.location.as_ref().unwrap().address.as_deref(), Some("Valence"));
    assert!(north.last_report_at.is_some());

    // Sparse records survive with everything optional left unset
    let bare = &plants[1];
    assert_eq!(bare.external_id, "1002");
    assert_eq!(bare.name, None);
    assert_eq!(bare.capacity_kw, None);
    assert_eq!(bare.location, None);
}

#[tokio::test]
async fn empty_station_list_is_not_an_error() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/station/v1.0/station/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "stationList": []
        })))
        .mount(&server)
        .await;

    let adapter = SolarmanAdapter::new(credentials(&server.uri())).unwrap();
    let plants = adapter.list_plants().await.unwrap();
    assert!(plants.is_empty());
}

#[tokio::test]
async fn access_token_is_reused_across_listings() {
    let server = MockServer::start().await;
    // Two listings, one token fetch
    mock_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/station/v1.0/station/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "stationList": []
        })))
        .expect(2)
        .mount(&server)
        .await;

    let adapter = SolarmanAdapter::new(credentials(&server.uri())).unwrap();
    adapter.list_plants().await.unwrap();
    adapter.list_plants().await.unwrap();
}

#[tokio::test]
async fn rejected_credentials_fail_without_retries() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/account/v1.0/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid app credentials"))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = SolarmanAdapter::new(credentials(&server.uri())).unwrap();
    let err = adapter.list_plants().await.unwrap_err();
    assert!(matches!(err, VendorError::Auth(_)), "got {err:?}");
}

#[tokio::test]
async fn token_endpoint_refusal_without_token_is_an_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/account/v1.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "msg": "app is disabled"
        })))
        .mount(&server)
        .await;

    let adapter = SolarmanAdapter::new(credentials(&server.uri())).unwrap();
    let err = adapter.list_plants().await.unwrap_err();
    match err {
        VendorError::Auth(msg) => assert!(msg.contains("app is disabled")),
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_retried_before_giving_up() {
    let server = MockServer::start().await;
    mock_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/station/v1.0/station/list"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance window"))
        // Initial attempt plus the configured retries
        .expect(4)
        .mount(&server)
        .await;

    let adapter = SolarmanAdapter::new(credentials(&server.uri()))
        .unwrap()
        .with_retry(RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            jitter: false,
        });
    let err = adapter.list_plants().await.unwrap_err();
    assert!(matches!(err, VendorError::Api { status: 503, .. }), "got {err:?}");
}
