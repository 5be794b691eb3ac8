use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Source of raw history-page markup for a city code
pub trait HistorySource {
    fn fetch(&self, city_code: &str) -> Result<String, FetchError>;
}

/// Blocking HTTP fetcher for the provider's per-city history page.
///
/// One GET per call with the configured timeout and browser-like
/// `User-Agent`; there is no retry.
#[derive(Debug, Clone)]
pub struct HttpHistoryFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpHistoryFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent).map_err(|e| FetchError::Client(e.to_string()))?;
        headers.insert(USER_AGENT, agent);

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }
}

impl HistorySource for HttpHistoryFetcher {
    fn fetch(&self, city_code: &str) -> Result<String, FetchError> {
        let url = self.config.history_url(city_code);
        tracing::info!("Fetching history page {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::from_reqwest(&url, e))?;

        let bytes = response.bytes().map_err(|e| FetchError::from_reqwest(&url, e))?;
        // The provider serves UTF-8 regardless of what its headers claim
        let body = String::from_utf8_lossy(&bytes).into_owned();

        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody { url });
        }

        tracing::debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(body)
    }
}
