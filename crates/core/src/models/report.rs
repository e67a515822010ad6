use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ad_metrics::AdChannel;
use super::credentials::ReportCredentials;
use super::date_range::DateRange;
use super::summary::{AggregateSummary, ChannelSummary, DailyBreakdown};
use crate::errors::{CoreError, ErrorKind};

/// The two independent sides of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Ads,
    Sales,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Ads => write!(f, "ads"),
            DataSource::Sales => write!(f, "sales"),
        }
    }
}

/// A fetch that failed while the rest of the report was still built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceWarning {
    pub source: DataSource,

    /// Set for ad-side failures
    pub channel: Option<AdChannel>,

    pub kind: ErrorKind,

    pub message: String,
}

impl SourceWarning {
    pub fn from_error(source: DataSource, channel: Option<AdChannel>, error: &CoreError) -> Self {
        Self {
            source,
            channel,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    /// Operator-facing label, e.g. "ads (Meta)" or "sales".
    #[must_use]
    pub fn label(&self) -> String {
        match self.channel {
            Some(channel) => format!("{} ({channel})", self.source),
            None => self.source.to_string(),
        }
    }
}

/// One operator action: who the report is for, the window, and any
/// credentials typed in for this request only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Key into the secret store; empty means the default client
    #[serde(default)]
    pub client: String,

    pub range: DateRange,

    /// Per-platform values here win over stored ones
    #[serde(default)]
    pub credentials: ReportCredentials,
}

impl ReportRequest {
    pub fn new(client: impl Into<String>, range: DateRange) -> Self {
        Self {
            client: client.into(),
            range,
            credentials: ReportCredentials::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: ReportCredentials) -> Self {
        self.credentials = credentials;
        self
    }
}

/// Result of one operator request: summary, breakdowns and any warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,

    pub generated_at: DateTime<Utc>,

    pub range: DateRange,

    /// Totals over everything that was fetched successfully
    pub summary: AggregateSummary,

    /// One entry per ad channel that returned data
    pub channels: Vec<ChannelSummary>,

    /// One row per day of the range
    pub daily: Vec<DailyBreakdown>,

    /// Ad channels that were configured for this request
    pub requested_channels: Vec<AdChannel>,

    /// Whether a sales source was configured for this request
    pub sales_requested: bool,

    pub warnings: Vec<SourceWarning>,
}

impl Report {
    /// No configured source failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }

    /// At least one configured fetcher of `source` succeeded.
    #[must_use]
    pub fn is_source_available(&self, source: DataSource) -> bool {
        match source {
            DataSource::Ads => self.requested_channels.iter().any(|channel| {
                !self
                    .warnings
                    .iter()
                    .any(|w| w.source == DataSource::Ads && w.channel == Some(*channel))
            }),
            DataSource::Sales => {
                self.sales_requested && self.warnings_for(DataSource::Sales).next().is_none()
            }
        }
    }

    /// Some but not all configured ad channels failed.
    #[must_use]
    pub fn is_source_partial(&self, source: DataSource) -> bool {
        self.is_source_available(source) && self.warnings_for(source).next().is_some()
    }

    pub fn warnings_for(&self, source: DataSource) -> impl Iterator<Item = &SourceWarning> {
        self.warnings.iter().filter(move |w| w.source == source)
    }

    /// Turn a degraded report into a `PartialData` error, for callers that need every source.
    pub fn ensure_complete(self) -> Result<Self, CoreError> {
        if self.is_complete() {
            return Ok(self);
        }
        let failed = self.warnings.iter().map(SourceWarning::label).collect();
        Err(CoreError::PartialData { failed })
    }
}
