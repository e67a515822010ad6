use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::de::{amount_lenient, u64_lenient};
use super::http::{
    build_client, classify_status, map_send_error, send_with_retry, PageBudget, RetryPolicy,
};
use super::traits::AdsProvider;
use crate::errors::CoreError;
use crate::models::ad_metrics::{AdChannel, AdMetricRecord};
use crate::models::credentials::{MetaCredentials, Secret};
use crate::models::date_range::DateRange;
use crate::models::settings::Settings;

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";
const PROVIDER: &str = "Meta Ads";
const ACCOUNT_PREFIX: &str = "act_";
const INSIGHT_FIELDS: &str = "date_start,date_stop,impressions,clicks,spend";

/// Meta Graph API Ads Insights provider.
///
/// - **Requires**: access token with `ads_read`, ad account id.
/// - **Endpoint**: `GET /{version}/act_{id}/insights`, account level, `time_increment=1`
///   so each row is one day.
/// - **Pagination**: follows `paging.next` until absent.
///
/// Insights values (impressions, clicks, spend) arrive as strings.
pub struct MetaAdsProvider {
    client: Client,
    access_token: Secret,
    account_id: String,
    base_url: String,
    retry: RetryPolicy,
    timeout: Duration,
    max_pages: u32,
}

impl MetaAdsProvider {
    pub fn new(credentials: &MetaCredentials, settings: &Settings) -> Result<Self, CoreError> {
        credentials.validate()?;
        let account_id = normalize_account_id(&credentials.account_id)?;
        let base = settings
            .meta_base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        let timeout = settings.request_timeout();
        Ok(Self {
            client: build_client(timeout)?,
            access_token: credentials.access_token.clone(),
            account_id,
            base_url: format!("{base}/{}", settings.meta_api_version),
            retry: RetryPolicy::from_settings(settings),
            timeout,
            max_pages: settings.max_pages,
        })
    }

    /// Normalized account id, always `act_`-prefixed.
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    fn insights_url(&self) -> String {
        format!("{}/{}/insights", self.base_url, self.account_id)
    }
}

/// Prefix the account id with `act_` unless already present. The remainder must be numeric.
pub fn normalize_account_id(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix(ACCOUNT_PREFIX).unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::ValidationError(format!(
            "invalid Meta ad account id '{raw}': expected digits, optionally prefixed with '{ACCOUNT_PREFIX}'"
        )));
    }
    Ok(format!("{ACCOUNT_PREFIX}{digits}"))
}

// ── Graph API response types ────────────────────────────────────────

#[derive(Deserialize)]
struct InsightsPage {
    #[serde(default)]
    data: Vec<InsightsRow>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Deserialize)]
struct InsightsRow {
    date_start: NaiveDate,
    #[serde(default, deserialize_with = "u64_lenient")]
    impressions: u64,
    #[serde(default, deserialize_with = "u64_lenient")]
    clicks: u64,
    #[serde(default, deserialize_with = "amount_lenient")]
    spend: f64,
}

#[derive(Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Deserialize)]
struct GraphError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: i64,
}

/// Graph API errors carry a numeric code that matters more than the HTTP status:
/// throttling often comes back as 400 or 403.
pub fn classify_meta_error(
    provider: &str,
    status: StatusCode,
    retry_after_secs: Option<u64>,
    body: &str,
) -> CoreError {
    let Ok(envelope) = serde_json::from_str::<GraphErrorEnvelope>(body) else {
        return classify_status(provider, status, retry_after_secs, body);
    };
    let GraphError { message, code } = envelope.error;
    match code {
        // invalid or expired token
        190 => CoreError::Auth {
            provider: provider.to_string(),
            message: format!("code {code}: {message}"),
        },
        // missing permission on the ad account
        10 | 200..=299 => CoreError::Auth {
            provider: provider.to_string(),
            message: format!("code {code}: {message}"),
        },
        // application, user, or ad-account level throttling
        4 | 17 | 32 | 613 | 80000..=80014 => CoreError::RateLimit {
            provider: provider.to_string(),
            retry_after_secs,
            attempts: 1,
        },
        _ => match classify_status(provider, status, retry_after_secs, body) {
            CoreError::Api { provider, .. } => CoreError::Api {
                provider,
                message: format!("code {code}: {message}"),
            },
            other => other,
        },
    }
}

#[async_trait]
impl AdsProvider for MetaAdsProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn channel(&self) -> AdChannel {
        AdChannel::Meta
    }

    async fn fetch_daily_metrics(
        &self,
        range: &DateRange,
    ) -> Result<Vec<AdMetricRecord>, CoreError> {
        let url = self.insights_url();
        let time_range = serde_json::json!({
            "since": range.start().format("%Y-%m-%d").to_string(),
            "until": range.end().format("%Y-%m-%d").to_string(),
        })
        .to_string();

        let mut budget = PageBudget::new(PROVIDER, self.max_pages);
        let mut next_url: Option<String> = None;
        let mut records = Vec::new();

        loop {
            let response = match &next_url {
                None => {
                    send_with_retry(PROVIDER, &self.retry, self.timeout, classify_meta_error, || {
                        self.client
                            .get(&url)
                            .bearer_auth(self.access_token.expose())
                            .query(&[
                                ("level", "account"),
                                ("time_increment", "1"),
                                ("fields", INSIGHT_FIELDS),
                                ("time_range", time_range.as_str()),
                            ])
                    })
                    .await?
                }
                // `paging.next` is a complete URL including the cursor
                Some(next) => {
                    send_with_retry(PROVIDER, &self.retry, self.timeout, classify_meta_error, || {
                        self.client
                            .get(next.as_str())
                            .bearer_auth(self.access_token.expose())
                    })
                    .await?
                }
            };

            let body = response
                .text()
                .await
                .map_err(|e| map_send_error(PROVIDER, self.timeout, e))?;
            let page: InsightsPage = serde_json::from_str(&body).map_err(|e| {
                CoreError::Deserialization(format!("{PROVIDER} insights page: {e}"))
            })?;

            debug!(account = %self.account_id, rows = page.data.len(), "insights page");
            records.extend(page.data.into_iter().map(|row| {
                AdMetricRecord::new(
                    AdChannel::Meta,
                    row.date_start,
                    row.impressions,
                    row.clicks,
                    row.spend,
                )
            }));

            next_url = page.paging.and_then(|p| p.next);
            if !budget.advance(next_url.is_some())? {
                break;
            }
        }

        info!(
            account = %self.account_id,
            range = %range,
            records = records.len(),
            pages = budget.pages_fetched(),
            "fetched Meta insights"
        );
        Ok(records)
    }
}
