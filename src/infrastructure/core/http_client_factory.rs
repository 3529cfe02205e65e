use anyhow::{Context, Result};
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

/// Kline windows are small; a slow response is treated as a transient failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Client for read-only market data GETs. Connect errors, 5xx and 429 are
    /// retried up to `max_retries` times with exponential backoff.
    pub fn create_client(max_retries: u32) -> Result<ClientWithMiddleware> {
        let client = Client::builder()
            .user_agent(concat!("pricecast/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        Ok(ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_without_retries() {
        assert!(HttpClientFactory::create_client(0).is_ok());
        assert!(HttpClientFactory::create_client(5).is_ok());
    }
}
