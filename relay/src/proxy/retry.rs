use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, Method, Request, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Bounded retry with linear backoff: retry `n` waits `n * backoff_unit`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff_unit * retry
    }
}

/// A response whose body has been read to the end within its attempt.
#[derive(Debug)]
pub struct BufferedResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Methods that may be replayed without changing upstream state.
pub fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE | Method::TRACE
    )
}

/// Network-level failures: connect errors, timeouts, resets while sending
/// or while the body is still arriving.
pub fn is_transient_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}

pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// One attempt: send, then read the whole body under the same timeout.
async fn send_buffered(client: &Client, request: Request) -> Result<BufferedResponse, reqwest::Error> {
    let response = client.execute(request).await?;
    let status = response.status();
    let body = response.bytes().await?;
    Ok(BufferedResponse { status, body })
}

/// Execute `request`, retrying transient failures according to `policy`.
///
/// Only idempotent requests are retried. When retries run out the last
/// outcome is returned as-is: the last response (even if it is a 5xx) or
/// the last transport error.
pub async fn robust_request(
    client: &Client,
    request: Request,
    policy: &RetryPolicy,
) -> Result<BufferedResponse, reqwest::Error> {
    let idempotent = is_idempotent(request.method());
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        // Streaming bodies cannot be replayed; send once.
        let this_try = match request.try_clone() {
            Some(r) => r,
            None => return send_buffered(client, request).await,
        };

        let can_retry = idempotent && attempt <= policy.max_retries;

        match send_buffered(client, this_try).await {
            Ok(response) => {
                let status = response.status;
                if !is_transient_status(status) {
                    return Ok(response);
                }
                if !can_retry {
                    debug!(
                        "giving up on {} {} after {} attempt(s); last status: {}",
                        request.method(),
                        request.url().path(),
                        attempt,
                        status
                    );
                    return Ok(response);
                }

                let wait = policy.delay_for(attempt);
                warn!(
                    "Attempt {}/{} failed with status {}. Retrying in {:?}...",
                    attempt,
                    policy.max_retries + 1,
                    status,
                    wait
                );
                sleep(wait).await;
            }
            Err(e) => {
                if !is_transient_error(&e) || !can_retry {
                    return Err(e);
                }

                let wait = policy.delay_for(attempt);
                warn!(
                    "Attempt {}/{} failed with error: {}. Retrying in {:?}...",
                    attempt,
                    policy.max_retries + 1,
                    e.without_url(),
                    wait
                );
                sleep(wait).await;
            }
        }
    }
}
