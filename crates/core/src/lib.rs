pub mod errors;
pub mod models;
pub mod providers;
pub mod secrets;
pub mod services;

use std::sync::Arc;

use models::{
    ad_metrics::AdMetricRecord,
    credentials::{Platform, ReportCredentials},
    date_range::DateRange,
    report::{Report, ReportRequest},
    sales::SalesRecord,
    settings::Settings,
    summary::AggregateSummary,
};
use providers::registry::ProviderRegistry;
use secrets::{MemorySecretStore, SecretKey, SecretStore, StoredCredential};
use services::{aggregation_service::AggregationService, report_service::ReportService};
use tracing::info;

use errors::CoreError;

/// Main entry point for the ROAS report core library.
/// Holds the fetch settings, the secret store and the services that build reports.
#[must_use]
pub struct RoasReporter {
    settings: Settings,
    secrets: Arc<dyn SecretStore>,
    report_service: ReportService,
    aggregation_service: AggregationService,
}

impl std::fmt::Debug for RoasReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoasReporter")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl RoasReporter {
    /// Create a reporter with an empty in-memory secret store.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        Self::with_secret_store(settings, Arc::new(MemorySecretStore::new()))
    }

    /// Create a reporter that resolves credentials through `secrets`.
    pub fn with_secret_store(
        settings: Settings,
        secrets: Arc<dyn SecretStore>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let report_service = ReportService::new(&settings);
        Ok(Self {
            settings,
            secrets,
            report_service,
            aggregation_service: AggregationService::new(),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Credentials ─────────────────────────────────────────────────

    /// Store every platform present in `credentials` under `client`.
    pub fn store_credentials(
        &self,
        client: &str,
        credentials: &ReportCredentials,
    ) -> Result<(), CoreError> {
        secrets::store_credentials(self.secrets.as_ref(), client, credentials)
    }

    /// Look up a single platform credential.
    pub fn credential(
        &self,
        client: &str,
        platform: Platform,
    ) -> Result<StoredCredential, CoreError> {
        let key = SecretKey::new(client, platform);
        self.secrets
            .get(&key)?
            .ok_or(CoreError::MissingCredential {
                platform: platform.to_string(),
                client: key.client,
            })
    }

    /// Credentials for a request: values typed into the request first, then
    /// whatever the store holds for the client.
    ///
    /// Shopify and at least one ad channel must resolve, otherwise
    /// `MissingCredential` names the first gap.
    pub fn resolve_credentials(
        &self,
        request: &ReportRequest,
    ) -> Result<ReportCredentials, CoreError> {
        let stored = secrets::load_credentials(self.secrets.as_ref(), &request.client)?;
        let credentials = request.credentials.clone().or(stored);
        let client = secrets::client_name(&request.client);

        if credentials.meta.is_none() && credentials.google.is_none() {
            return Err(CoreError::MissingCredential {
                platform: Platform::MetaAds.to_string(),
                client,
            });
        }
        if credentials.shopify.is_none() {
            return Err(CoreError::MissingCredential {
                platform: Platform::Shopify.to_string(),
                client,
            });
        }
        Ok(credentials)
    }

    // ── Reports ─────────────────────────────────────────────────────

    /// Build a report, degrading gracefully: a failing source becomes a
    /// warning on the report instead of an error.
    ///
    /// Errors only for problems with the request itself (credentials, ids).
    pub async fn fetch_report(&self, request: &ReportRequest) -> Result<Report, CoreError> {
        let credentials = self.resolve_credentials(request)?;
        let registry = ProviderRegistry::from_credentials(&credentials, &self.settings)?;
        info!(
            client = %secrets::client_name(&request.client),
            range = %request.range,
            channels = registry.channels().len(),
            "fetching report"
        );
        Ok(self.report_service.build_report(&request.range, &registry).await)
    }

    /// Like [`fetch_report`](Self::fetch_report), but any failed source is a
    /// `PartialData` error.
    pub async fn fetch_complete_report(
        &self,
        request: &ReportRequest,
    ) -> Result<Report, CoreError> {
        self.fetch_report(request).await?.ensure_complete()
    }

    /// Build a report from an already assembled registry (custom or mock providers).
    pub async fn fetch_report_with(&self, range: &DateRange, registry: &ProviderRegistry) -> Report {
        self.report_service.build_report(range, registry).await
    }

    /// Aggregate records the caller already holds.
    #[must_use]
    pub fn aggregate(
        &self,
        range: &DateRange,
        ads: &[AdMetricRecord],
        sales: &[SalesRecord],
    ) -> AggregateSummary {
        self.aggregation_service.aggregate(range, ads, sales)
    }
}
