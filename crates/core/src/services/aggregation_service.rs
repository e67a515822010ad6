use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::ad_metrics::{cost_per_click, cost_per_mille, AdChannel, AdMetricRecord};
use crate::models::date_range::DateRange;
use crate::models::sales::SalesRecord;
use crate::models::summary::{return_on_spend, AggregateSummary, ChannelSummary, DailyBreakdown};

/// Combines ad and sales records into report totals.
///
/// Every method is a pure function of its inputs. Records dated outside the
/// requested range are ignored: upstream date filters are not exact (Shopify
/// filters in UTC, orders are bucketed by shop-local date).
pub struct AggregationService;

impl AggregationService {
    pub fn new() -> Self {
        Self
    }

    /// Totals and derived ratios over the range.
    ///
    /// AOV and ROAS stay `None` when orders or spend are zero.
    #[must_use]
    pub fn aggregate(
        &self,
        range: &DateRange,
        ads: &[AdMetricRecord],
        sales: &[SalesRecord],
    ) -> AggregateSummary {
        let mut total_impressions = 0u64;
        let mut total_clicks = 0u64;
        let mut total_spend = 0.0;
        for record in ads.iter().filter(|r| range.contains(r.date)) {
            total_impressions += record.impressions;
            total_clicks += record.clicks;
            total_spend += record.spend;
        }

        let mut total_revenue = 0.0;
        let mut total_orders = 0u64;
        for record in sales.iter().filter(|r| range.contains(r.date)) {
            total_revenue += record.revenue;
            total_orders += record.order_count;
        }

        AggregateSummary {
            total_impressions,
            total_clicks,
            total_spend,
            total_revenue,
            total_orders,
            cpc: cost_per_click(total_spend, total_clicks),
            cpm: cost_per_mille(total_spend, total_impressions),
            average_order_value: (total_orders > 0).then(|| total_revenue / total_orders as f64),
            roas: return_on_spend(total_revenue, total_spend),
        }
    }

    /// One summary per channel with in-range records, in channel order.
    /// Channel ROAS divides the shop's total revenue by that channel's spend.
    #[must_use]
    pub fn channel_summaries(
        &self,
        range: &DateRange,
        ads: &[AdMetricRecord],
        total_revenue: f64,
    ) -> Vec<ChannelSummary> {
        let mut by_channel: BTreeMap<AdChannel, (u64, u64, f64)> = BTreeMap::new();
        for record in ads.iter().filter(|r| range.contains(r.date)) {
            let entry = by_channel.entry(record.channel).or_insert((0, 0, 0.0));
            entry.0 += record.impressions;
            entry.1 += record.clicks;
            entry.2 += record.spend;
        }

        by_channel
            .into_iter()
            .map(|(channel, (impressions, clicks, spend))| ChannelSummary {
                channel,
                impressions,
                clicks,
                spend,
                cpc: cost_per_click(spend, clicks),
                cpm: cost_per_mille(spend, impressions),
                roas: return_on_spend(total_revenue, spend),
            })
            .collect()
    }

    /// One row per day of the range, oldest first; days without data are zero rows.
    #[must_use]
    pub fn daily_breakdown(
        &self,
        range: &DateRange,
        ads: &[AdMetricRecord],
        sales: &[SalesRecord],
    ) -> Vec<DailyBreakdown> {
        let mut days: BTreeMap<NaiveDate, DailyBreakdown> = range
            .days()
            .map(|date| {
                (
                    date,
                    DailyBreakdown {
                        date,
                        spend: 0.0,
                        revenue: 0.0,
                        orders: 0,
                        roas: None,
                    },
                )
            })
            .collect();

        for record in ads {
            if let Some(day) = days.get_mut(&record.date) {
                day.spend += record.spend;
            }
        }
        for record in sales {
            if let Some(day) = days.get_mut(&record.date) {
                day.revenue += record.revenue;
                day.orders += record.order_count;
            }
        }

        days.into_values()
            .map(|mut day| {
                day.roas = return_on_spend(day.revenue, day.spend);
                day
            })
            .collect()
    }
}

impl Default for AggregationService {
    fn default() -> Self {
        Self::new()
    }
}
