//! Rate-limited HTTP transport shared by the broker clients.
//!
//! One transport instance exists per broker client. Spacing is enforced
//! with a single mutex-guarded "last request" slot rather than a token
//! bucket: each request reserves `max(now, last + min_interval)` and sleeps
//! the remainder. A throttling response is retried exactly once after a
//! fixed back-off; a second one surfaces as an error.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, COOKIE, USER_AGENT};
use reqwest::{RequestBuilder, Response, StatusCode};

use crate::errors::{BrokerSyncError, Result};
use crate::session::SessionAuth;

/// Fixed user agent sent with every broker request.
const FORMUE_USER_AGENT: &str = "formue-sync/0.1";

/// Default timeout for one broker API request.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP transport enforcing minimum inter-request spacing per broker.
#[derive(Debug)]
pub struct RateLimitedTransport {
    client: reqwest::Client,
    min_interval: Duration,
    throttle_backoff: Duration,
    /// Last reserved request slot for this broker.
    last_request: Mutex<Option<Instant>>,
}

impl RateLimitedTransport {
    /// Creates a transport with the given spacing and throttle back-off.
    pub fn new(min_interval: Duration, throttle_backoff: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(FORMUE_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .cookie_store(true)
            .build()
            .map_err(BrokerSyncError::Http)?;

        Ok(Self {
            client,
            min_interval,
            throttle_backoff,
            last_request: Mutex::new(None),
        })
    }

    /// The underlying HTTP client, for building requests.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Lock the slot mutex, recovering from poison.
    ///
    /// Worst case after recovery is slightly wrong spacing, which beats
    /// panicking the sync worker.
    fn lock_slot(&self) -> MutexGuard<'_, Option<Instant>> {
        self.last_request.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Reserves the next request slot and sleeps until it is due.
    pub(crate) async fn pace(&self) {
        let wait = {
            let mut last = self.lock_slot();
            let now = Instant::now();
            let slot = match *last {
                Some(prev) => (prev + self.min_interval).max(now),
                None => now,
            };
            *last = Some(slot);
            slot.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            debug!("Rate limiter: waiting {:?} before next request", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Sends a request with spacing, one bounded throttle retry, and 401
    /// translation to the session-expired error.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        // Bounded loop instead of recursion: at most one retry.
        let mut pending = Some(request);
        let mut attempt = 0;
        loop {
            let current = match pending.take() {
                Some(req) => req,
                // Streaming bodies cannot be cloned for a retry.
                None => return Err(BrokerSyncError::RateLimited),
            };
            let retry = current.try_clone();

            self.pace().await;
            let response = current.send().await.map_err(BrokerSyncError::Http)?;

            match response.status() {
                StatusCode::TOO_MANY_REQUESTS if attempt == 0 => {
                    warn!(
                        "Broker throttled the request, retrying once after {:?}",
                        self.throttle_backoff
                    );
                    tokio::time::sleep(self.throttle_backoff).await;
                    pending = retry;
                    attempt += 1;
                }
                StatusCode::TOO_MANY_REQUESTS => return Err(BrokerSyncError::RateLimited),
                StatusCode::UNAUTHORIZED => return Err(BrokerSyncError::SessionExpired),
                _ => return Ok(response),
            }
        }
    }

    /// Attaches session material matching the active protocol variant.
    pub fn apply_auth(request: RequestBuilder, auth: &SessionAuth) -> RequestBuilder {
        match auth {
            SessionAuth::Cookies { cookies, csrf } => request
                .header(COOKIE, cookies.as_str())
                .header("x-csrf-token", csrf.as_str()),
            SessionAuth::Bearer { token, tag } => request
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .header("ntag", tag.as_str()),
            SessionAuth::OAuth { access_token } => {
                request.header(AUTHORIZATION, format!("Bearer {}", access_token))
            }
        }
    }

    /// Turns a non-success response into the API error, with the status and
    /// a truncated body for the log.
    pub async fn error_for_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!("Broker API error {}: {}", status, body.chars().take(200).collect::<String>());
        Err(BrokerSyncError::api(status.as_u16(), &body))
    }
}
