use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::de::u64_lenient;
use super::http::{
    build_client, classify_status, map_send_error, send_with_retry, PageBudget, RetryPolicy,
};
use super::traits::AdsProvider;
use crate::errors::CoreError;
use crate::models::ad_metrics::{AdChannel, AdMetricRecord};
use crate::models::credentials::{GoogleAdsCredentials, Secret};
use crate::models::date_range::DateRange;
use crate::models::settings::Settings;

const DEFAULT_BASE_URL: &str = "https://googleads.googleapis.com";
const PROVIDER: &str = "Google Ads";
const MICROS_PER_UNIT: f64 = 1_000_000.0;

/// Google Ads API provider (REST `googleAds:search`).
///
/// - **Requires**: developer token, OAuth access token, customer id;
///   optionally the manager (login) customer id.
/// - **Query**: GAQL over the `customer` resource segmented by date, so each
///   result row is one day of account totals.
/// - **Pagination**: follows `nextPageToken`.
///
/// Cost arrives in micros of the account currency.
pub struct GoogleAdsProvider {
    client: Client,
    developer_token: Secret,
    access_token: Secret,
    customer_id: String,
    login_customer_id: Option<String>,
    base_url: String,
    retry: RetryPolicy,
    timeout: Duration,
    max_pages: u32,
}

impl GoogleAdsProvider {
    pub fn new(credentials: &GoogleAdsCredentials, settings: &Settings) -> Result<Self, CoreError> {
        credentials.validate()?;
        let customer_id = normalize_customer_id(&credentials.customer_id)?;
        let login_customer_id = credentials
            .login_customer_id
            .as_deref()
            .map(normalize_customer_id)
            .transpose()?;
        let base = settings
            .google_ads_base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        let timeout = settings.request_timeout();
        Ok(Self {
            client: build_client(timeout)?,
            developer_token: credentials.developer_token.clone(),
            access_token: credentials.access_token.clone(),
            customer_id,
            login_customer_id,
            base_url: format!("{base}/{}", settings.google_ads_api_version),
            retry: RetryPolicy::from_settings(settings),
            timeout,
            max_pages: settings.max_pages,
        })
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    fn search_url(&self) -> String {
        format!("{}/customers/{}/googleAds:search", self.base_url, self.customer_id)
    }
}

/// Strip the dashes Google shows in its UI ("123-456-7890"); ten digits must remain.
pub fn normalize_customer_id(raw: &str) -> Result<String, CoreError> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect();
    if digits.len() != 10 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::ValidationError(format!(
            "invalid Google Ads customer id '{raw}': expected 10 digits"
        )));
    }
    Ok(digits)
}

/// GAQL for daily account totals.
pub fn daily_metrics_query(range: &DateRange) -> String {
    format!(
        "SELECT segments.date, metrics.impressions, metrics.clicks, metrics.cost_micros \
         FROM customer \
         WHERE segments.date BETWEEN '{}' AND '{}'",
        range.start().format("%Y-%m-%d"),
        range.end().format("%Y-%m-%d"),
    )
}

// ── Google Ads API request/response types ───────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchRow>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct SearchRow {
    segments: Segments,
    #[serde(default)]
    metrics: Metrics,
}

#[derive(Deserialize)]
struct Segments {
    date: NaiveDate,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metrics {
    #[serde(default, deserialize_with = "u64_lenient")]
    impressions: u64,
    #[serde(default, deserialize_with = "u64_lenient")]
    clicks: u64,
    #[serde(default, deserialize_with = "u64_lenient")]
    cost_micros: u64,
}

#[async_trait]
impl AdsProvider for GoogleAdsProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn channel(&self) -> AdChannel {
        AdChannel::Google
    }

    async fn fetch_daily_metrics(
        &self,
        range: &DateRange,
    ) -> Result<Vec<AdMetricRecord>, CoreError> {
        let url = self.search_url();
        let query = daily_metrics_query(range);

        let mut budget = PageBudget::new(PROVIDER, self.max_pages);
        let mut page_token: Option<String> = None;
        let mut records = Vec::new();

        loop {
            let body = SearchRequest {
                query: &query,
                page_token: page_token.as_deref().filter(|t| !t.is_empty()),
            };
            let response = send_with_retry(PROVIDER, &self.retry, self.timeout, classify_status, || {
                let request = self
                    .client
                    .post(&url)
                    .bearer_auth(self.access_token.expose())
                    .header("developer-token", self.developer_token.expose())
                    .json(&body);
                match &self.login_customer_id {
                    Some(login) => request.header("login-customer-id", login.as_str()),
                    None => request,
                }
            })
            .await?;

            let text = response
                .text()
                .await
                .map_err(|e| map_send_error(PROVIDER, self.timeout, e))?;
            let page: SearchResponse = serde_json::from_str(&text).map_err(|e| {
                CoreError::Deserialization(format!("{PROVIDER} search page: {e}"))
            })?;

            debug!(customer = %self.customer_id, rows = page.results.len(), "search page");
            records.extend(page.results.into_iter().map(|row| {
                AdMetricRecord::new(
                    AdChannel::Google,
                    row.segments.date,
                    row.metrics.impressions,
                    row.metrics.clicks,
                    row.metrics.cost_micros as f64 / MICROS_PER_UNIT,
                )
            }));

            page_token = page.next_page_token.filter(|t| !t.is_empty());
            if !budget.advance(page_token.is_some())? {
                break;
            }
        }

        info!(
            customer = %self.customer_id,
            range = %range,
            records = records.len(),
            pages = budget.pages_fetched(),
            "fetched Google Ads metrics"
        );
        Ok(records)
    }
}
