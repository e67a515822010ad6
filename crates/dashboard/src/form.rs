use chrono::NaiveDate;
use roas_report_core::errors::CoreError;
use roas_report_core::models::credentials::{
    GoogleAdsCredentials, MetaCredentials, ReportCredentials, ShopifyCredentials,
};
use roas_report_core::models::date_range::DateRange;
use roas_report_core::models::report::ReportRequest;
use serde::Deserialize;

/// Days covered by the form when it is first shown.
pub const DEFAULT_RANGE_DAYS: u32 = 30;

/// Fields of the report form, shared by `POST /report` (url-encoded) and
/// `POST /api/report` (JSON). Blank fields fall back to configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportForm {
    pub client: String,
    pub ads_token: String,
    pub ad_account_id: String,
    pub shop_domain: String,
    pub shop_token: String,
    pub google_developer_token: String,
    pub google_access_token: String,
    pub google_customer_id: String,
    pub google_login_customer_id: String,
    pub date_start: String,
    pub date_end: String,
}

impl ReportForm {
    pub fn into_request(self) -> Result<ReportRequest, CoreError> {
        let range = DateRange::parse(&self.date_start, &self.date_end)?;

        let meta = any_filled(&[&self.ads_token, &self.ad_account_id])
            .then(|| MetaCredentials::new(self.ads_token.as_str(), self.ad_account_id.as_str()));

        let shopify = any_filled(&[&self.shop_domain, &self.shop_token])
            .then(|| ShopifyCredentials::new(self.shop_domain.as_str(), self.shop_token.as_str()));

        let google = any_filled(&[
            &self.google_developer_token,
            &self.google_access_token,
            &self.google_customer_id,
            &self.google_login_customer_id,
        ])
        .then(|| {
            GoogleAdsCredentials::new(
                self.google_developer_token.as_str(),
                self.google_access_token.as_str(),
                self.google_customer_id.as_str(),
            )
            .with_login_customer_id(self.google_login_customer_id.as_str())
        });

        Ok(ReportRequest::new(self.client, range).with_credentials(ReportCredentials {
            meta,
            shopify,
            google,
        }))
    }
}

fn any_filled(values: &[&String]) -> bool {
    values.iter().any(|v| !v.trim().is_empty())
}

/// What the form shows. Tokens are never echoed back into the page; the view
/// only records whether a configured default exists for them.
#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    pub client: String,
    pub ad_account_id: String,
    pub shop_domain: String,
    pub google_customer_id: String,
    pub google_login_customer_id: String,
    pub date_start: String,
    pub date_end: String,
    pub meta_token_configured: bool,
    pub shop_token_configured: bool,
    pub google_tokens_configured: bool,
}

impl FormView {
    /// Fresh form: the last 30 days and the configured non-secret values.
    pub fn initial(defaults: &ReportCredentials, today: NaiveDate) -> Self {
        let (date_start, date_end) = match DateRange::last_n_days(today, DEFAULT_RANGE_DAYS) {
            Ok(range) => (range.start().to_string(), range.end().to_string()),
            Err(_) => (today.to_string(), today.to_string()),
        };
        Self {
            client: String::new(),
            ad_account_id: defaults
                .meta
                .as_ref()
                .map(|m| m.account_id.clone())
                .unwrap_or_default(),
            shop_domain: defaults
                .shopify
                .as_ref()
                .map(|s| s.shop_domain.clone())
                .unwrap_or_default(),
            google_customer_id: defaults
                .google
                .as_ref()
                .map(|g| g.customer_id.clone())
                .unwrap_or_default(),
            google_login_customer_id: defaults
                .google
                .as_ref()
                .and_then(|g| g.login_customer_id.clone())
                .unwrap_or_default(),
            date_start,
            date_end,
            meta_token_configured: defaults.meta.is_some(),
            shop_token_configured: defaults.shopify.is_some(),
            google_tokens_configured: defaults.google.is_some(),
        }
    }

    /// The form as the operator submitted it, for re-rendering.
    pub fn submitted(form: &ReportForm, defaults: &ReportCredentials) -> Self {
        Self {
            client: form.client.clone(),
            ad_account_id: form.ad_account_id.clone(),
            shop_domain: form.shop_domain.clone(),
            google_customer_id: form.google_customer_id.clone(),
            google_login_customer_id: form.google_login_customer_id.clone(),
            date_start: form.date_start.clone(),
            date_end: form.date_end.clone(),
            meta_token_configured: defaults.meta.is_some(),
            shop_token_configured: defaults.shopify.is_some(),
            google_tokens_configured: defaults.google.is_some(),
        }
    }
}
