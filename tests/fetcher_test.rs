//! Integration tests for HttpHistoryFetcher using wiremock.
//!
//! The fetcher is blocking, so it is built, used and dropped inside
//! `spawn_blocking` while the mock server runs on the async runtime.

use std::time::Duration;

use weather_lstm::config::FetchConfig;
use weather_lstm::error::FetchError;
use weather_lstm::scrape::{HistorySource, HttpHistoryFetcher};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> FetchConfig {
    FetchConfig {
        url_template: format!("{}/wea_history/{{}}.htm", server.uri()),
        timeout_secs: 1,
        ..FetchConfig::default()
    }
}

async fn fetch(config: FetchConfig, code: &'static str) -> Result<String, FetchError> {
    tokio::task::spawn_blocking(move || -> Result<String, FetchError> { HttpHistoryFetcher::new(config)?.fetch(code) })
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_sends_user_agent_and_returns_page() {
    let mock_server = MockServer::start().await;
    let config = FetchConfig {
        user_agent: "weather-lstm-test/1.0".to_string(),
        ..config_for(&mock_server)
    };

    Mock::given(method("GET"))
        .and(path("/wea_history/54511.htm"))
        .and(header("user-agent", "weather-lstm-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<table><tr><td>2023-10-01</td></tr></table>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let page = fetch(config, "54511").await.unwrap();

    assert!(page.contains("<td>2023-10-01</td>"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_decodes_utf8() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wea_history/58362.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes("<td>25°</td><td>多云</td>".as_bytes()))
        .mount(&mock_server)
        .await;

    let page = fetch(config_for(&mock_server), "58362").await.unwrap();

    assert_eq!(page, "<td>25°</td><td>多云</td>");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let err = fetch(config_for(&mock_server), "00000").await.unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_empty_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
        .mount(&mock_server)
        .await;

    let err = fetch(config_for(&mock_server), "54511").await.unwrap_err();

    assert!(matches!(err, FetchError::EmptyBody { ref url } if url.ends_with("/wea_history/54511.htm")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("late").set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let err = fetch(config_for(&mock_server), "54511").await.unwrap_err();

    assert!(matches!(err, FetchError::Timeout { .. }), "got {:?}", err);
}
