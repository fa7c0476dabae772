//! Shared HTTP layer: bounded retries with exponential backoff.

use crate::{FetcherError, Result};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// HTTP client with retry semantics shared by all fetchers.
///
/// Retries 5xx responses and transport errors with exponential backoff,
/// waits out rate-limit responses using the `Retry-After` hint when one is
/// present, and hands any other 4xx straight back to the caller.
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    base_delay_ms: u64,
}

impl HttpClient {
    pub fn new(user_agent: &str, headers: HeaderMap, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            max_retries,
            base_delay_ms: 1000,
        })
    }

    pub async fn get(&self, url: &str) -> Result<Response> {
        let mut last_error: Option<FetcherError> = None;

        for attempt in 0..self.max_retries {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let wait_ms = retry_after_ms(&response)
                            .unwrap_or(self.base_delay_ms * (attempt as u64 + 1));
                        debug!(url = url, wait_ms = wait_ms, "Rate limited, backing off");
                        sleep_ms(wait_ms).await;
                        last_error = Some(FetcherError::Api(format!("rate limited: {}", status)));
                        continue;
                    }

                    if status.is_server_error() {
                        last_error = Some(FetcherError::Api(format!("server error: {}", status)));
                        sleep_ms(self.base_delay_ms * 2u64.pow(attempt)).await;
                        continue;
                    }

                    // Other client errors are not retryable; the caller
                    // decides what a 404 means for its unit.
                    return Ok(response);
                }
                Err(e) => {
                    debug!(url = url, attempt = attempt, error = %e, "Request failed");
                    last_error = Some(FetcherError::Http(e));
                    if attempt + 1 < self.max_retries {
                        sleep_ms(self.base_delay_ms * 2u64.pow(attempt)).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| FetcherError::Api("request failed after retries".to_string())))
    }
}

fn retry_after_ms(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(|secs| secs * 1000)
}
