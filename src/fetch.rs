//! Storefront app-details fetching with retry and backoff.

use crate::config::{RetryPolicy, StorefrontConfig};
use crate::error::Result;
use crate::model::{AppDetails, AppId};
use crate::pacing::Sleeper;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Result of a single request to the storefront.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    /// `success: true` with a decodable payload.
    Payload(AppDetails),
    /// The storefront answered but does not know the app (delisted, bad id).
    Invalid,
    /// HTTP 429.
    RateLimited,
    /// Transport error, unexpected status, or an unreadable body.
    Failed { timeout: bool, reason: String },
}

/// One request per call; retrying is left to [`Fetcher`].
pub trait StoreTransport {
    fn request(&self, app_id: AppId) -> Attempt;
}

impl<T: StoreTransport + ?Sized> StoreTransport for &T {
    fn request(&self, app_id: AppId) -> Attempt {
        (**self).request(app_id)
    }
}

/// Interprets an HTTP response from `/api/appdetails`.
///
/// The body is an object keyed by the requested id:
/// `{"<id>": {"success": true, "data": {...}}}`.
pub fn classify_response(app_id: AppId, status: u16, body: &str) -> Attempt {
    if status == 429 {
        return Attempt::RateLimited;
    }
    if !(200..300).contains(&status) {
        return Attempt::Failed {
            timeout: false,
            reason: format!("HTTP {}", status),
        };
    }

    let root: Value = match serde_json::from_str(body) {
        Ok(root) => root,
        Err(err) => {
            return Attempt::Failed {
                timeout: false,
                reason: format!("unreadable body: {}", err),
            };
        }
    };

    let Some(entry) = root.get(app_id.to_string()) else {
        return Attempt::Invalid;
    };
    if !entry
        .get("success")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
    {
        return Attempt::Invalid;
    }

    let data = entry.get("data").cloned();
    match data.map(serde_json::from_value::<AppDetails>) {
        Some(Ok(details)) => Attempt::Payload(details),
        Some(Err(err)) => Attempt::Failed {
            timeout: false,
            reason: format!("unexpected payload shape: {}", err),
        },
        None => Attempt::Invalid,
    }
}

/// Blocking HTTP implementation of [`StoreTransport`].
pub struct HttpStorefront {
    client: reqwest::blocking::Client,
    base_url: String,
    locale: String,
    region: String,
}

impl HttpStorefront {
    pub fn new(config: &StorefrontConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            locale: config.locale.clone(),
            region: config.region.clone(),
        })
    }

    pub fn details_url(&self, app_id: AppId) -> String {
        format!(
            "{}/api/appdetails?appids={}&l={}&cc={}",
            self.base_url,
            app_id,
            urlencoding::encode(&self.locale),
            urlencoding::encode(&self.region)
        )
    }
}

impl StoreTransport for HttpStorefront {
    fn request(&self, app_id: AppId) -> Attempt {
        let url = self.details_url(app_id);
        let response = match self.client.get(&url).send() {
            Ok(response) => response,
            Err(err) => {
                return Attempt::Failed {
                    timeout: err.is_timeout(),
                    reason: err.to_string(),
                };
            }
        };
        let status = response.status().as_u16();
        match response.text() {
            Ok(body) => classify_response(app_id, status, &body),
            Err(err) => Attempt::Failed {
                timeout: err.is_timeout(),
                reason: err.to_string(),
            },
        }
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Final result for one item after retries.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(AppDetails),
    /// Permanently invalid; not retried.
    Invalid,
    /// Every attempt failed.
    Exhausted,
}

/// Runs the retry policy over a transport.
pub struct Fetcher<T, S> {
    transport: T,
    retry: RetryPolicy,
    sleeper: S,
}

impl<T: StoreTransport, S: Sleeper> Fetcher<T, S> {
    pub fn new(transport: T, retry: RetryPolicy, sleeper: S) -> Self {
        Self {
            transport,
            retry,
            sleeper,
        }
    }

    pub fn fetch(&self, app_id: AppId) -> FetchOutcome {
        let attempts = self.retry.max_attempts;
        for attempt in 0..attempts {
            match self.transport.request(app_id) {
                Attempt::Payload(details) => return FetchOutcome::Fetched(details),
                Attempt::Invalid => {
                    debug!(app_id, "Storefront reports app as invalid");
                    return FetchOutcome::Invalid;
                }
                Attempt::RateLimited => {
                    let wait = self.retry.rate_limit_delay(attempt);
                    warn!(
                        app_id,
                        attempt = attempt + 1,
                        wait_secs = wait.as_secs(),
                        "Rate limited, backing off"
                    );
                    self.sleeper.sleep(wait);
                }
                Attempt::Failed { timeout, reason } => {
                    let wait = if timeout {
                        self.retry.timeout_backoff
                    } else {
                        self.retry.error_backoff
                    };
                    warn!(
                        app_id,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        timeout,
                        error = %reason,
                        "Request failed, retrying"
                    );
                    self.sleeper.sleep(wait);
                }
            }
        }
        FetchOutcome::Exhausted
    }
}
