use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A credential value. `Debug` never prints the contents.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    /// The raw value, for building upstream requests only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "Secret(<empty>)")
        } else {
            write!(f, "Secret(<redacted>)")
        }
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// The upstream platforms a credential can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    MetaAds,
    GoogleAds,
    Shopify,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::MetaAds => write!(f, "meta_ads"),
            Platform::GoogleAds => write!(f, "google_ads"),
            Platform::Shopify => write!(f, "shopify"),
        }
    }
}

/// Meta Ads Insights access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaCredentials {
    /// Token with the `ads_read` permission
    pub access_token: Secret,

    /// Ad account id, with or without the `act_` prefix
    pub account_id: String,
}

/// Shopify Admin API access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopifyCredentials {
    /// e.g. "example.myshopify.com"
    pub shop_domain: String,

    /// Admin API access token with `read_orders`
    pub access_token: Secret,
}

/// Google Ads API access. The access token must already be valid;
/// exchanging a refresh token is left to the operator's tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleAdsCredentials {
    pub developer_token: Secret,
    pub access_token: Secret,

    /// Customer id, dashes allowed ("123-456-7890")
    pub customer_id: String,

    /// Manager (MCC) account used to authenticate, when different from the customer
    #[serde(default)]
    pub login_customer_id: Option<String>,
}

/// Everything a single report request may carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportCredentials {
    #[serde(default)]
    pub meta: Option<MetaCredentials>,

    #[serde(default)]
    pub shopify: Option<ShopifyCredentials>,

    #[serde(default)]
    pub google: Option<GoogleAdsCredentials>,
}

impl MetaCredentials {
    pub fn new(access_token: impl Into<Secret>, account_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            account_id: account_id.into().trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        require("Meta access token", self.access_token.expose())?;
        require("Meta ad account id", &self.account_id)
    }
}

impl ShopifyCredentials {
    pub fn new(shop_domain: impl Into<String>, access_token: impl Into<Secret>) -> Self {
        Self {
            shop_domain: shop_domain.into().trim().to_string(),
            access_token: access_token.into(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        require("Shopify store domain", &self.shop_domain)?;
        require("Shopify access token", self.access_token.expose())
    }
}

impl GoogleAdsCredentials {
    pub fn new(
        developer_token: impl Into<Secret>,
        access_token: impl Into<Secret>,
        customer_id: impl Into<String>,
    ) -> Self {
        Self {
            developer_token: developer_token.into(),
            access_token: access_token.into(),
            customer_id: customer_id.into().trim().to_string(),
            login_customer_id: None,
        }
    }

    pub fn with_login_customer_id(mut self, login_customer_id: impl Into<String>) -> Self {
        let value = login_customer_id.into().trim().to_string();
        self.login_customer_id = (!value.is_empty()).then_some(value);
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        require("Google developer token", self.developer_token.expose())?;
        require("Google access token", self.access_token.expose())?;
        require("Google customer id", &self.customer_id)
    }
}

impl ReportCredentials {
    /// Fill every platform missing here from `fallback`.
    #[must_use]
    pub fn or(self, fallback: ReportCredentials) -> Self {
        Self {
            meta: self.meta.or(fallback.meta),
            shopify: self.shopify.or(fallback.shopify),
            google: self.google.or(fallback.google),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meta.is_none() && self.shopify.is_none() && self.google.is_none()
    }

    /// The report needs at least one ad channel and the sales source.
    pub fn require_sources(&self) -> Result<(), CoreError> {
        if self.meta.is_none() && self.google.is_none() {
            return Err(CoreError::ValidationError(
                "at least one ad channel (Meta or Google) must be configured".into(),
            ));
        }
        if self.shopify.is_none() {
            return Err(CoreError::ValidationError(
                "Shopify credentials are required".into(),
            ));
        }
        Ok(())
    }

    /// `require_sources` plus every present platform's own checks.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.require_sources()?;
        if let Some(meta) = &self.meta {
            meta.validate()?;
        }
        if let Some(google) = &self.google {
            google.validate()?;
        }
        if let Some(shopify) = &self.shopify {
            shopify.validate()?;
        }
        Ok(())
    }
}

fn require(label: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::ValidationError(format!("{label} is required")));
    }
    Ok(())
}
