use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pcare_bot::error::{AppError, NumberSourceError};
use pcare_bot::models::load_numbers_from_url;
use pcare_bot::services::{ApiNumberSource, NumberSource};

async fn source_for(server: &MockServer) -> ApiNumberSource {
    ApiNumberSource::new(
        format!("{}/api/next-number", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn fetches_number_without_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/next-number"))
        .and(header("cache-control", "no-store"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "numbers": "0001234567890" })))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server).await;
    assert_eq!(source.fetch().await.unwrap(), "0001234567890");
}

#[tokio::test]
async fn non_success_status_is_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/next-number"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = source_for(&server).await.fetch().await.unwrap_err();
    match err {
        AppError::NumberSource(NumberSourceError::Network { reason, .. }) => {
            assert_eq!(reason, "API status 500");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn empty_numbers_is_an_invalid_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/next-number"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "numbers": "  " })))
        .mount(&server)
        .await;

    let err = source_for(&server).await.fetch().await.unwrap_err();
    assert!(matches!(
        err,
        AppError::NumberSource(NumberSourceError::InvalidPayload { .. })
    ));
}

#[tokio::test]
async fn non_json_body_is_an_invalid_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/next-number"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = source_for(&server).await.fetch().await.unwrap_err();
    assert!(matches!(
        err,
        AppError::NumberSource(NumberSourceError::InvalidPayload { .. })
    ));
}

#[tokio::test]
async fn number_list_loads_from_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/numbers.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("0001\n\n 0002 \n0003\n"))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let numbers = load_numbers_from_url(&client, &format!("{}/numbers.txt", server.uri()))
        .await
        .unwrap();
    assert_eq!(numbers, vec!["0001", "0002", "0003"]);
}
