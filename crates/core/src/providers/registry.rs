use tracing::warn;

use crate::errors::CoreError;
use crate::models::ad_metrics::AdChannel;
use crate::models::credentials::ReportCredentials;
use crate::models::report::{DataSource, SourceWarning};
use crate::models::settings::Settings;

use super::google_ads::GoogleAdsProvider;
use super::meta_ads::MetaAdsProvider;
use super::shopify::ShopifyProvider;
use super::traits::{AdsProvider, SalesProvider};

/// The data sources configured for one report request.
///
/// Holds at most one provider per ad channel plus the sales source. Built
/// fresh per request from that request's credentials. A source whose
/// credentials were supplied but could not be used is kept as a warning so
/// the report still shows it as requested and failed.
pub struct ProviderRegistry {
    ads: Vec<Box<dyn AdsProvider>>,
    sales: Option<Box<dyn SalesProvider>>,
    unusable: Vec<SourceWarning>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            ads: Vec::new(),
            sales: None,
            unusable: Vec::new(),
        }
    }

    /// Create the registry for a set of credentials. Google Ads is only
    /// configured when its credentials are present.
    ///
    /// Only a missing sales source or a missing ad side fails here; a provider
    /// that rejects its own credentials (bad account id, blank token) is
    /// recorded as an unusable source and the others are still fetched.
    pub fn from_credentials(
        credentials: &ReportCredentials,
        settings: &Settings,
    ) -> Result<Self, CoreError> {
        credentials.require_sources()?;
        let mut registry = Self::new();

        if let Some(meta) = &credentials.meta {
            match MetaAdsProvider::new(meta, settings) {
                Ok(provider) => registry.register_ads(Box::new(provider)),
                Err(e) => registry.mark_unusable(DataSource::Ads, Some(AdChannel::Meta), &e),
            }
        }

        if let Some(google) = &credentials.google {
            match GoogleAdsProvider::new(google, settings) {
                Ok(provider) => registry.register_ads(Box::new(provider)),
                Err(e) => registry.mark_unusable(DataSource::Ads, Some(AdChannel::Google), &e),
            }
        }

        if let Some(shopify) = &credentials.shopify {
            match ShopifyProvider::new(shopify, settings) {
                Ok(provider) => registry.set_sales(Box::new(provider)),
                Err(e) => registry.mark_unusable(DataSource::Sales, None, &e),
            }
        }

        Ok(registry)
    }

    /// Record a requested source that cannot be fetched.
    pub fn mark_unusable(
        &mut self,
        source: DataSource,
        channel: Option<AdChannel>,
        error: &CoreError,
    ) {
        warn!(
            source = %source,
            kind = %error.kind(),
            error = %error,
            "skipping source with unusable credentials"
        );
        self.unusable.retain(|w| !(w.source == source && w.channel == channel));
        self.unusable.push(SourceWarning::from_error(source, channel, error));
    }

    /// Sources that were requested but could not be set up.
    pub fn unusable(&self) -> &[SourceWarning] {
        &self.unusable
    }

    /// Register an ad channel. A second provider for the same channel replaces the first.
    pub fn register_ads(&mut self, provider: Box<dyn AdsProvider>) {
        let channel = provider.channel();
        self.ads.retain(|p| p.channel() != channel);
        self.unusable.retain(|w| w.channel != Some(channel));
        self.ads.push(provider);
        self.ads.sort_by_key(|p| p.channel());
    }

    pub fn set_sales(&mut self, provider: Box<dyn SalesProvider>) {
        self.unusable.retain(|w| w.source != DataSource::Sales);
        self.sales = Some(provider);
    }

    pub fn get_ads_provider(&self, channel: AdChannel) -> Option<&dyn AdsProvider> {
        self.ads
            .iter()
            .find(|p| p.channel() == channel)
            .map(|p| p.as_ref())
    }

    /// All ad providers, in channel order.
    pub fn ads_providers(&self) -> impl Iterator<Item = &dyn AdsProvider> {
        self.ads.iter().map(|p| p.as_ref())
    }

    pub fn sales_provider(&self) -> Option<&dyn SalesProvider> {
        self.sales.as_deref()
    }

    /// Every requested ad channel, usable or not, in channel order.
    pub fn channels(&self) -> Vec<AdChannel> {
        let mut channels: Vec<AdChannel> = self
            .ads
            .iter()
            .map(|p| p.channel())
            .chain(self.unusable.iter().filter_map(|w| w.channel))
            .collect();
        channels.sort();
        channels.dedup();
        channels
    }

    /// A sales source was requested, whether or not it could be set up.
    pub fn sales_requested(&self) -> bool {
        self.sales.is_some() || self.unusable.iter().any(|w| w.source == DataSource::Sales)
    }

    pub fn is_empty(&self) -> bool {
        self.ads.is_empty() && self.sales.is_none() && self.unusable.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
