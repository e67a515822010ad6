use chrono::Utc;
use futures::future::join_all;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::ad_metrics::{AdChannel, AdMetricRecord};
use crate::models::date_range::DateRange;
use crate::models::report::{DataSource, Report, SourceWarning};
use crate::models::sales::SalesRecord;
use crate::models::settings::Settings;
use crate::providers::registry::ProviderRegistry;
use crate::providers::traits::{AdsProvider, SalesProvider};
use crate::services::aggregation_service::AggregationService;

/// Fetches every configured source for a range and assembles the report.
///
/// Sources are fetched concurrently and independently: a failing source
/// becomes a [`SourceWarning`] and the aggregation runs on whatever did
/// succeed. Each fetcher call is bounded by the configured timeout.
pub struct ReportService {
    aggregation: AggregationService,
    call_timeout: Duration,
}

impl ReportService {
    pub fn new(settings: &Settings) -> Self {
        Self::with_timeout(settings.request_timeout())
    }

    pub fn with_timeout(call_timeout: Duration) -> Self {
        Self {
            aggregation: AggregationService::new(),
            call_timeout,
        }
    }

    pub async fn build_report(&self, range: &DateRange, registry: &ProviderRegistry) -> Report {
        let ads_fetches = join_all(
            registry
                .ads_providers()
                .map(|provider| self.fetch_ads(provider, range)),
        );
        let sales_fetch = async {
            match registry.sales_provider() {
                Some(provider) => Some(self.fetch_sales(provider, range).await),
                None => None,
            }
        };
        let (ads_results, sales_result) = tokio::join!(ads_fetches, sales_fetch);

        let mut warnings = registry.unusable().to_vec();
        let mut ads: Vec<AdMetricRecord> = Vec::new();
        for (channel, result) in ads_results {
            match result {
                Ok(records) => ads.extend(records),
                Err(e) => {
                    warn!(source = "ads", channel = %channel, kind = %e.kind(), error = %e, "ad source failed");
                    warnings.push(SourceWarning::from_error(DataSource::Ads, Some(channel), &e));
                }
            }
        }

        let sales: Vec<SalesRecord> = match sales_result {
            Some(Ok(records)) => records,
            Some(Err(e)) => {
                warn!(source = "sales", kind = %e.kind(), error = %e, "sales source failed");
                warnings.push(SourceWarning::from_error(DataSource::Sales, None, &e));
                Vec::new()
            }
            None => Vec::new(),
        };

        let summary = self.aggregation.aggregate(range, &ads, &sales);
        let channels = self
            .aggregation
            .channel_summaries(range, &ads, summary.total_revenue);
        let daily = self.aggregation.daily_breakdown(range, &ads, &sales);

        let report = Report {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            range: *range,
            summary,
            channels,
            daily,
            requested_channels: registry.channels(),
            sales_requested: registry.sales_requested(),
            warnings,
        };
        info!(
            report = %report.id,
            range = %range,
            complete = report.is_complete(),
            warnings = report.warnings.len(),
            "report built"
        );
        report
    }

    async fn fetch_ads(
        &self,
        provider: &dyn AdsProvider,
        range: &DateRange,
    ) -> (AdChannel, Result<Vec<AdMetricRecord>, CoreError>) {
        let channel = provider.channel();
        let result = tokio::time::timeout(self.call_timeout, provider.fetch_daily_metrics(range))
            .await
            .unwrap_or_else(|_| Err(self.timeout_error(provider.name())));
        (channel, result)
    }

    async fn fetch_sales(
        &self,
        provider: &dyn SalesProvider,
        range: &DateRange,
    ) -> Result<Vec<SalesRecord>, CoreError> {
        tokio::time::timeout(self.call_timeout, provider.fetch_daily_sales(range))
            .await
            .unwrap_or_else(|_| Err(self.timeout_error(provider.name())))
    }

    fn timeout_error(&self, provider: &str) -> CoreError {
        CoreError::Timeout {
            provider: provider.to_string(),
            seconds: self.call_timeout.as_secs_f64().ceil() as u64,
        }
    }
}
