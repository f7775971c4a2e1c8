use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{CourtsideError, Result};

const MAX_RETRIES: u8 = 3;
const RETRY_BASE_DELAY_MS: u64 = 500;

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// The HTTP surface the sync path needs, kept behind a trait so tests can
/// swap in canned responses.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> Result<T>;
    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>>;
    /// Single GET without retries; returns status and body so the caller
    /// applies its own idea of failure. Used for the message gateway, which
    /// must not be hit twice for one message.
    async fn get_text(&self, url: &Url) -> Result<(u16, String)>;
}

// ---------------------------------------------------------------------------
// Reqwest backend
// ---------------------------------------------------------------------------

pub struct ReqwestBackend {
    client: reqwest::Client,
    max_retries: u8,
    retry_base_delay_ms: u64,
}

impl ReqwestBackend {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create HTTP client");
        Self {
            client,
            max_retries: MAX_RETRIES,
            retry_base_delay_ms: RETRY_BASE_DELAY_MS,
        }
    }

    /// GET with exponential backoff. 5xx and network errors are retried,
    /// 4xx fails immediately.
    async fn fetch_with_retry(&self, url: &Url) -> Result<reqwest::Response> {
        let mut last_error: Option<CourtsideError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(
                    self.retry_base_delay_ms * 2u64.pow(u32::from(attempt) - 1),
                );
                tokio::time::sleep(delay).await;
            }

            match self.client.get(url.as_str()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    let err = CourtsideError::ApiStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    };
                    if status.is_server_error() && attempt < self.max_retries {
                        tracing::debug!("retrying after {status} from {url}");
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tracing::debug!("retrying after network error: {e}");
                        last_error = Some(e.into());
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CourtsideError::Other("request failed".to_string())))
    }
}

impl Default for ReqwestBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> Result<T> {
        let response = self.fetch_with_retry(url).await?;
        Ok(response.json().await?)
    }

    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self.fetch_with_retry(url).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn get_text(&self, url: &Url) -> Result<(u16, String)> {
        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }
}

// ---------------------------------------------------------------------------
// Fake backend for tests
// ---------------------------------------------------------------------------
