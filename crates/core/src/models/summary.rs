use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ad_metrics::AdChannel;

/// Totals over a date range, across every ad channel and the sales source.
///
/// Derived ratios are `None` when their denominator is zero, so a report
/// without ad spend shows no ROAS instead of a misleading `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    /// Impressions across all in-range ad records
    pub total_impressions: u64,

    /// Clicks across all in-range ad records
    pub total_clicks: u64,

    /// Ad spend across all in-range ad records
    pub total_spend: f64,

    /// Revenue across all in-range sales records
    pub total_revenue: f64,

    /// Orders across all in-range sales records
    pub total_orders: u64,

    /// total_spend / total_clicks
    pub cpc: Option<f64>,

    /// total_spend / total_impressions × 1000
    pub cpm: Option<f64>,

    /// total_revenue / total_orders
    pub average_order_value: Option<f64>,

    /// total_revenue / total_spend
    pub roas: Option<f64>,
}

/// Per-channel advertising totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub channel: AdChannel,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub cpc: Option<f64>,
    pub cpm: Option<f64>,

    /// Total revenue over this channel's spend. Revenue is not attributed per
    /// channel, so channel ROAS values do not sum to the overall ROAS.
    pub roas: Option<f64>,
}

/// One row of the day-by-day table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBreakdown {
    pub date: NaiveDate,
    pub spend: f64,
    pub revenue: f64,
    pub orders: u64,
    pub roas: Option<f64>,
}

/// revenue / spend, undefined without spend.
pub(crate) fn return_on_spend(revenue: f64, spend: f64) -> Option<f64> {
    (spend > 0.0).then(|| revenue / spend)
}
