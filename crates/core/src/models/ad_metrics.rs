use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The advertising platform a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AdChannel {
    /// Meta (Facebook/Instagram) Ads Insights
    Meta,
    /// Google Ads
    Google,
}

impl AdChannel {
    /// All channels, in display order.
    pub const ALL: [AdChannel; 2] = [AdChannel::Meta, AdChannel::Google];
}

impl std::fmt::Display for AdChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdChannel::Meta => write!(f, "Meta"),
            AdChannel::Google => write!(f, "Google"),
        }
    }
}

/// One day of advertising metrics for one channel.
///
/// CPC and CPM are derived, never stored: the upstream values are rounded
/// per row and would not add up across days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdMetricRecord {
    pub channel: AdChannel,

    /// Reporting day. For upstreams without a daily breakdown, the first day of the window.
    pub date: NaiveDate,

    pub impressions: u64,

    pub clicks: u64,

    /// Spend in the ad account currency
    pub spend: f64,
}

impl AdMetricRecord {
    pub fn new(
        channel: AdChannel,
        date: NaiveDate,
        impressions: u64,
        clicks: u64,
        spend: f64,
    ) -> Self {
        Self {
            channel,
            date,
            impressions,
            clicks,
            spend,
        }
    }

    /// A spend-only record, for callers that do not track delivery.
    pub fn spend_only(channel: AdChannel, date: NaiveDate, spend: f64) -> Self {
        Self::new(channel, date, 0, 0, spend)
    }

    /// Cost per click, undefined without clicks.
    #[must_use]
    pub fn cpc(&self) -> Option<f64> {
        cost_per_click(self.spend, self.clicks)
    }

    /// Cost per thousand impressions, undefined without impressions.
    #[must_use]
    pub fn cpm(&self) -> Option<f64> {
        cost_per_mille(self.spend, self.impressions)
    }
}

pub(crate) fn cost_per_click(spend: f64, clicks: u64) -> Option<f64> {
    (clicks > 0).then(|| spend / clicks as f64)
}

pub(crate) fn cost_per_mille(spend: f64, impressions: u64) -> Option<f64> {
    (impressions > 0).then(|| spend * 1000.0 / impressions as f64)
}
