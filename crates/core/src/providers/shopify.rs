use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::header::LINK;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::de::amount_lenient;
use super::http::{
    build_client, classify_status, map_send_error, next_link, send_with_retry, PageBudget,
    RetryPolicy,
};
use super::traits::SalesProvider;
use crate::errors::CoreError;
use crate::models::credentials::{Secret, ShopifyCredentials};
use crate::models::date_range::DateRange;
use crate::models::sales::Order;
use crate::models::settings::Settings;

const PROVIDER: &str = "Shopify";
const PAGE_LIMIT: &str = "250";
const ORDER_FIELDS: &str = "id,created_at,total_price";
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Shopify Admin REST API provider for orders.
///
/// - **Requires**: store domain and an Admin API token with `read_orders`.
/// - **Endpoint**: `GET /admin/api/{version}/orders.json?status=any`, 250 per page,
///   over a UTC window padded to cover every shop timezone.
/// - **Pagination**: cursor-based through the `Link` header (`rel="next"`).
///   The next URL already carries `page_info` and must not be combined with
///   the original filters.
pub struct ShopifyProvider {
    client: Client,
    access_token: Secret,
    shop_domain: String,
    base_url: String,
    retry: RetryPolicy,
    timeout: Duration,
    max_pages: u32,
}

impl ShopifyProvider {
    pub fn new(credentials: &ShopifyCredentials, settings: &Settings) -> Result<Self, CoreError> {
        credentials.validate()?;
        let shop_domain = normalize_shop_domain(&credentials.shop_domain)?;
        let origin = settings
            .shopify_base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("https://{shop_domain}"));
        let timeout = settings.request_timeout();
        Ok(Self {
            client: build_client(timeout)?,
            access_token: credentials.access_token.clone(),
            shop_domain,
            base_url: format!("{origin}/admin/api/{}", settings.shopify_api_version),
            retry: RetryPolicy::from_settings(settings),
            timeout,
            max_pages: settings.max_pages,
        })
    }

    pub fn shop_domain(&self) -> &str {
        &self.shop_domain
    }

    fn orders_url(&self) -> String {
        format!("{}/orders.json", self.base_url)
    }
}

/// Lowercase, strip scheme and trailing slash; a bare shop handle gets `.myshopify.com`.
pub fn normalize_shop_domain(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/')
        .to_ascii_lowercase();

    let valid = !without_scheme.is_empty()
        && without_scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if !valid {
        return Err(CoreError::ValidationError(format!(
            "invalid Shopify store domain '{raw}': expected e.g. example.myshopify.com"
        )));
    }
    if without_scheme.contains('.') {
        Ok(without_scheme)
    } else {
        Ok(format!("{without_scheme}.myshopify.com"))
    }
}

/// `created_at_min`/`created_at_max` for a range of shop-local dates.
///
/// Shopify filters by instant while orders are bucketed by the shop's own
/// calendar date, so the UTC window is padded by a day on each side (offsets
/// never exceed 14h). Orders outside the range are dropped after fetching.
pub fn query_window(range: &DateRange) -> (String, String) {
    let start = range.start().pred_opt().unwrap_or(range.start());
    let end = range.end().succ_opt().unwrap_or(range.end());
    (
        format!("{}T00:00:00Z", start.format("%Y-%m-%d")),
        format!("{}T23:59:59Z", end.format("%Y-%m-%d")),
    )
}

// ── Shopify API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct OrdersPage {
    #[serde(default)]
    orders: Vec<OrderRow>,
}

#[derive(Deserialize)]
struct OrderRow {
    created_at: DateTime<FixedOffset>,
    #[serde(default, deserialize_with = "amount_lenient")]
    total_price: f64,
}

#[async_trait]
impl SalesProvider for ShopifyProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_orders(&self, range: &DateRange) -> Result<Vec<Order>, CoreError> {
        let url = self.orders_url();
        let (created_at_min, created_at_max) = query_window(range);

        let mut budget = PageBudget::new(PROVIDER, self.max_pages);
        let mut next_url: Option<String> = None;
        let mut orders = Vec::new();

        loop {
            let response = match &next_url {
                None => {
                    send_with_retry(PROVIDER, &self.retry, self.timeout, classify_status, || {
                        self.client
                            .get(&url)
                            .header(ACCESS_TOKEN_HEADER, self.access_token.expose())
                            .query(&[
                                ("status", "any"),
                                ("limit", PAGE_LIMIT),
                                ("fields", ORDER_FIELDS),
                                ("created_at_min", created_at_min.as_str()),
                                ("created_at_max", created_at_max.as_str()),
                            ])
                    })
                    .await?
                }
                Some(next) => {
                    send_with_retry(PROVIDER, &self.retry, self.timeout, classify_status, || {
                        self.client
                            .get(next.as_str())
                            .header(ACCESS_TOKEN_HEADER, self.access_token.expose())
                    })
                    .await?
                }
            };

            let link = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_link);
            let body = response
                .text()
                .await
                .map_err(|e| map_send_error(PROVIDER, self.timeout, e))?;
            let page: OrdersPage = serde_json::from_str(&body).map_err(|e| {
                CoreError::Deserialization(format!("{PROVIDER} orders page: {e}"))
            })?;

            debug!(shop = %self.shop_domain, orders = page.orders.len(), "orders page");
            orders.extend(
                page.orders
                    .into_iter()
                    .map(|row| Order::new(row.created_at, row.total_price))
                    .filter(|order| range.contains(order.date())),
            );

            next_url = link;
            if !budget.advance(next_url.is_some())? {
                break;
            }
        }

        info!(
            shop = %self.shop_domain,
            range = %range,
            orders = orders.len(),
            pages = budget.pages_fetched(),
            "fetched Shopify orders"
        );
        Ok(orders)
    }
}
