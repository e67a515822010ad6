use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::ad_metrics::{AdChannel, AdMetricRecord};
use crate::models::date_range::DateRange;
use crate::models::sales::{Order, SalesRecord};

/// Source of advertising metrics for one ad account on one platform.
///
/// Each platform (Meta, Google) implements this trait; the report service
/// only ever sees `dyn AdsProvider`, so a platform can be swapped or mocked
/// without touching aggregation.
#[async_trait]
pub trait AdsProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Which channel the returned records are tagged with.
    fn channel(&self) -> AdChannel;

    /// Per-day metrics for the range, following every page upstream.
    /// Implementations may return records outside the range; the aggregator filters them.
    async fn fetch_daily_metrics(
        &self,
        range: &DateRange,
    ) -> Result<Vec<AdMetricRecord>, CoreError>;
}

/// Source of orders for one shop.
#[async_trait]
pub trait SalesProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Every order created in the range, following every page upstream.
    async fn fetch_orders(&self, range: &DateRange) -> Result<Vec<Order>, CoreError>;

    /// Orders bucketed into per-day totals.
    async fn fetch_daily_sales(&self, range: &DateRange) -> Result<Vec<SalesRecord>, CoreError> {
        let orders = self.fetch_orders(range).await?;
        Ok(SalesRecord::from_orders(&orders))
    }
}
