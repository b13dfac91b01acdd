use crate::error::{Result, TideError};
use crate::request::{TideRequest, NOAA_DATAGETTER_URL};
use crate::source::{check_body, TideSource};
use log::debug;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Default per-request timeout for the datagetter.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// `reqwest` client for the CO-OPS datagetter.
#[derive(Debug, Clone)]
pub struct NoaaClient {
    client: Client,
    base_url: String,
}

impl NoaaClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(NOAA_DATAGETTER_URL, timeout)
    }

    /// Point the client at a different endpoint (mirrors, local test servers).
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(NoaaClient {
            client,
            base_url: base_url.to_string(),
        })
    }
}

impl From<reqwest::Error> for TideError {
    fn from(err: reqwest::Error) -> Self {
        TideError::HttpRequest(err.to_string())
    }
}

impl TideSource for NoaaClient {
    async fn fetch_csv(&self, request: &TideRequest) -> Result<String> {
        debug!("GET {}", request.url(&self.base_url));
        let response = self
            .client
            .get(&self.base_url)
            .query(&request.query_params())
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(TideError::HttpStatus {
                status: response.status().as_u16(),
                url: request.url(&self.base_url),
            });
        }
        let body = response.text().await?;
        check_body(&body)?;
        Ok(body)
    }
}
