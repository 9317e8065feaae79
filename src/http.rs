//! Shared outbound HTTP plumbing: client construction and bounded retries

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::StatusCode;
use tokio::time::sleep;
use tracing::debug;
use tracing::warn;

use crate::config::HttpConfig;
use crate::errors::PortfolioChatError;
use crate::errors::Result;

/// Build the HTTP client shared by one external service
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| PortfolioChatError::HttpError(e.to_string()))
}

/// Why an outbound request did not produce a successful response
#[derive(Debug)]
pub enum RequestFailure {
    /// The request never got an HTTP response (connect error, timeout, ...)
    Transport(reqwest::Error),
    /// The service answered with a non-success status
    Status { status: StatusCode, body: String },
}

impl RequestFailure {
    /// Connect errors, timeouts, 429 and 5xx are worth another attempt
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "request failed: {e}"),
            Self::Status { status, body } => write!(f, "HTTP {status}: {body}"),
        }
    }
}

/// At most `max_retries` extra attempts for transient failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Policy that sends every request exactly once
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn from_config(config: &HttpConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    /// Send a request, retrying transient failures.
    ///
    /// Requests whose body cannot be cloned are sent once.
    pub async fn send(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<Response, RequestFailure> {
        let mut attempt = 0;

        loop {
            let outcome = match request.try_clone() {
                Some(req) => send_once(req).await,
                None => return send_once(request).await,
            };

            match outcome {
                Err(failure) if failure.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "Transient failure ({}), retry {}/{} in {:?}",
                        failure, attempt, self.max_retries, self.backoff
                    );
                    sleep(self.backoff).await;
                }
                Ok(response) => {
                    if attempt > 0 {
                        debug!("Request succeeded after {} retries", attempt);
                    }
                    return Ok(response);
                }
                Err(failure) => return Err(failure),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&HttpConfig::default())
    }
}

async fn send_once(request: RequestBuilder) -> std::result::Result<Response, RequestFailure> {
    let response = request.send().await.map_err(RequestFailure::Transport)?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(RequestFailure::Status { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transience() {
        let transient = RequestFailure::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: String::new(),
        };
        let throttled = RequestFailure::Status {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: String::new(),
        };
        let permanent = RequestFailure::Status {
            status: StatusCode::UNAUTHORIZED,
            body: "bad key".to_string(),
        };

        assert!(transient.is_transient());
        assert!(throttled.is_transient());
        assert!(!permanent.is_transient());
        assert_eq!(permanent.to_string(), "HTTP 401 Unauthorized: bad key");
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from_config(&HttpConfig {
            timeout_secs: 5,
            max_retries: 2,
            retry_backoff_ms: 250,
        });
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.backoff, Duration::from_millis(250));
        assert_eq!(RetryPolicy::none().max_retries, 0);
    }
}
