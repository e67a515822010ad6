//! Request plumbing shared by every upstream provider: client construction,
//! status classification, bounded retries with jittered exponential backoff,
//! and the pagination budget.

use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::{redact_query, CoreError};
use crate::models::settings::Settings;

const USER_AGENT: &str = concat!("roas-report/", env!("CARGO_PKG_VERSION"));

/// Longest upstream body excerpt kept in an error message.
const MAX_BODY_EXCERPT: usize = 300;

/// Build the HTTP client used by a provider. Every request carries `timeout`.
pub fn build_client(timeout: Duration) -> Result<Client, CoreError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| CoreError::Config(format!("failed to build HTTP client: {e}")))
}

/// Retry budget for throttled or transiently failing requests.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.retry_base_delay_ms),
            max_delay: Duration::from_millis(settings.retry_max_delay_ms),
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Un-jittered delay before retry number `attempt` (0-based): base × 2^attempt, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Backoff with ±50 % jitter so that parallel callers do not retry in lockstep.
    pub fn jittered_backoff(&self, attempt: u32) -> Duration {
        let backoff = self.backoff(attempt);
        if backoff.is_zero() {
            return backoff;
        }
        let factor: f64 = rand::thread_rng().gen_range(0.5..=1.5);
        backoff.mul_f64(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Translates a non-success upstream response into the error taxonomy.
pub type ErrorClassifier = fn(&str, StatusCode, Option<u64>, &str) -> CoreError;

/// Default mapping: 401/403 auth, 429 throttling, 5xx transient, anything else an API error.
pub fn classify_status(
    provider: &str,
    status: StatusCode,
    retry_after_secs: Option<u64>,
    body: &str,
) -> CoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CoreError::Auth {
            provider: provider.to_string(),
            message: format!("HTTP {status}: {}", excerpt(body)),
        },
        StatusCode::TOO_MANY_REQUESTS => CoreError::RateLimit {
            provider: provider.to_string(),
            retry_after_secs,
            attempts: 1,
        },
        s if s.is_server_error() => {
            CoreError::Network(format!("{provider} returned HTTP {status}"))
        }
        _ => CoreError::Api {
            provider: provider.to_string(),
            message: format!("HTTP {status}: {}", excerpt(body)),
        },
    }
}

/// Send the request built by `build`, retrying per `policy`.
///
/// `build` is called once per attempt because a `RequestBuilder` is consumed by `send`.
/// Only [`CoreError::is_retryable`] errors are retried; a `Retry-After` longer than
/// the policy's ceiling ends the loop immediately.
pub async fn send_with_retry<F>(
    provider: &str,
    policy: &RetryPolicy,
    timeout: Duration,
    classify: ErrorClassifier,
    build: F,
) -> Result<Response, CoreError>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt: u32 = 0;
    loop {
        let (error, retry_after) = match build().send().await {
            Ok(resp) if resp.status().is_success() => return Ok(resp),
            Ok(resp) => {
                let status = resp.status();
                let retry_after = parse_retry_after(resp.headers());
                let body = resp.text().await.unwrap_or_default();
                (
                    classify(provider, status, retry_after.map(|d| d.as_secs()), &body),
                    retry_after,
                )
            }
            Err(e) => (map_send_error(provider, timeout, e), None),
        };

        let attempts = attempt + 1;
        if !error.is_retryable() || attempt >= policy.max_retries {
            return Err(with_attempts(error, attempts));
        }

        let delay = match retry_after {
            Some(wait) if wait > policy.max_delay => {
                warn!(provider, wait_secs = wait.as_secs(), "upstream asked to wait longer than the retry ceiling");
                return Err(with_attempts(error, attempts));
            }
            Some(wait) => wait,
            None => policy.jittered_backoff(attempt),
        };
        warn!(
            provider,
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "retrying upstream request"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Transport-level failure to error: timeouts keep their own variant.
pub fn map_send_error(provider: &str, timeout: Duration, error: reqwest::Error) -> CoreError {
    if error.is_timeout() {
        return CoreError::Timeout {
            provider: provider.to_string(),
            seconds: timeout.as_secs(),
        };
    }
    CoreError::from(error)
}

fn with_attempts(error: CoreError, attempts: u32) -> CoreError {
    match error {
        CoreError::RateLimit {
            provider,
            retry_after_secs,
            ..
        } => CoreError::RateLimit {
            provider,
            retry_after_secs,
            attempts,
        },
        other => other,
    }
}

/// `Retry-After` in seconds. Shopify sends fractional values ("2.0"); HTTP dates are ignored.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?;
    let secs: f64 = raw.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(secs.ceil()))
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header.
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|param| {
            let param = param.trim();
            param.eq_ignore_ascii_case("rel=\"next\"") || param.eq_ignore_ascii_case("rel=next")
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

/// Cursor-pagination bookkeeping: counts pages and refuses to stop early.
#[derive(Debug)]
pub struct PageBudget {
    provider: String,
    max_pages: u32,
    fetched: u32,
}

impl PageBudget {
    pub fn new(provider: impl Into<String>, max_pages: u32) -> Self {
        Self {
            provider: provider.into(),
            max_pages,
            fetched: 0,
        }
    }

    /// Record a fetched page. Returns `Ok(true)` when the next page should be requested.
    /// A further page past the budget is a `Truncated` error.
    pub fn advance(&mut self, has_more: bool) -> Result<bool, CoreError> {
        self.fetched += 1;
        debug!(provider = %self.provider, page = self.fetched, has_more, "fetched page");
        if !has_more {
            return Ok(false);
        }
        if self.fetched >= self.max_pages {
            return Err(CoreError::Truncated {
                provider: self.provider.clone(),
                pages: self.max_pages,
            });
        }
        Ok(true)
    }

    pub fn pages_fetched(&self) -> u32 {
        self.fetched
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    let cut = if trimmed.len() > MAX_BODY_EXCERPT {
        let mut end = MAX_BODY_EXCERPT;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &trimmed[..end])
    } else {
        trimmed.to_string()
    };
    redact_query(&cut)
}
