//! Rate limiting and retry logic for metadata provider calls
//!
//! The TMDB client goes through a [`RateLimitedClient`] so bursts of new
//! shows do not trip the provider's request quota, and wraps each request in
//! [`retry_async`] to ride out transient failures.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::{Client, Response};
use tracing::{debug, warn};

/// Configuration for rate limiting
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per second
    pub requests_per_second: u32,
    /// Burst capacity (allows short bursts above the rate)
    pub burst_size: u32,
}

impl RateLimitConfig {
    /// TMDB allows ~40 requests per 10 seconds
    pub fn tmdb() -> Self {
        Self {
            requests_per_second: 4,
            burst_size: 10,
        }
    }
}

/// A rate-limited HTTP client wrapper
pub struct RateLimitedClient {
    client: Client,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    name: String,
}

impl RateLimitedClient {
    pub fn new(name: &str, config: RateLimitConfig, request_timeout: Duration) -> Result<Self> {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN));

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            limiter: Arc::new(RateLimiter::direct(quota)),
            name: name.to_string(),
        })
    }

    pub fn for_tmdb(request_timeout: Duration) -> Result<Self> {
        Self::new("tmdb", RateLimitConfig::tmdb(), request_timeout)
    }

    /// Wait for rate limit and make a GET request with query parameters
    pub async fn get_with_query<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        query: &T,
    ) -> Result<Response> {
        self.wait_for_permit().await;
        debug!(client = %self.name, url = %url, "Making rate-limited GET request");

        self.client
            .get(url)
            .query(query)
            .send()
            .await
            .context("HTTP request failed")
    }

    /// Wait for a rate limit permit
    pub async fn wait_for_permit(&self) {
        self.limiter.until_ready().await;
    }
}

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_retries: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn to_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            multiplier: self.multiplier,
            max_elapsed_time: Some(Duration::from_secs(60)),
            ..Default::default()
        }
    }
}

/// Execute an async operation with retry logic
pub async fn retry_async<T, E, Fut, F>(
    operation: F,
    config: &RetryConfig,
    operation_name: &str,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempts = 0;
    let mut backoff = config.to_backoff();

    loop {
        attempts += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempts >= config.max_retries {
                    warn!(
                        operation = %operation_name,
                        attempts = attempts,
                        error = %e,
                        "Operation failed after max retries"
                    );
                    return Err(e);
                }

                let Some(duration) = backoff.next_backoff() else {
                    return Err(e);
                };

                let retry_ms: u128 = duration.as_millis();
                warn!(
                    operation = %operation_name,
                    attempt = attempts,
                    error = %e,
                    retry_in_ms = retry_ms,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(duration).await;
            }
        }
    }
}

pub trait ResponseExt {
    /// 429, 408 or any 5xx
    fn is_transient_error(&self) -> bool;
}

impl ResponseExt for Response {
    fn is_transient_error(&self) -> bool {
        let status = self.status().as_u16();
        status == 429 || status == 408 || (500..600).contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(5),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result: Result<u32, String> = retry_async(
            || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(format!("attempt {n} failed")) } else { Ok(n) }
            },
            &fast_retry(),
            "flaky",
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result: Result<(), &str> = retry_async(
            || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("down")
            },
            &fast_retry(),
            "always-down",
        )
        .await;

        assert_eq!(result, Err("down"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_tmdb_client_builds() {
        assert!(RateLimitedClient::for_tmdb(Duration::from_secs(5)).is_ok());
    }
}
