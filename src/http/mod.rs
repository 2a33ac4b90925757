use crate::error::SyncError;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("listarr/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        debug!(%url, "Making GET request");
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        debug!(%url, "Making POST request");
        self.client.post(url)
    }
}

/// Converts a non-success response into `UpstreamUnavailable`, keeping the
/// status code and body for the log line.
pub async fn check_success(
    service: &'static str,
    response: Response,
) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SyncError::UpstreamUnavailable {
        service,
        status: status.as_u16(),
        body,
    })
}
