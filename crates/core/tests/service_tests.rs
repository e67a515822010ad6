// ═══════════════════════════════════════════════════════════════════
// Service Tests: ReportService orchestration, RoasReporter facade,
// secret stores
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use roas_report_core::errors::{CoreError, ErrorKind};
use roas_report_core::models::ad_metrics::{AdChannel, AdMetricRecord};
use roas_report_core::models::credentials::{
    GoogleAdsCredentials, MetaCredentials, Platform, ReportCredentials, ShopifyCredentials,
};
use roas_report_core::models::date_range::DateRange;
use roas_report_core::models::report::{DataSource, ReportRequest};
use roas_report_core::models::sales::{Order, SalesRecord};
use roas_report_core::models::settings::Settings;
use roas_report_core::providers::registry::ProviderRegistry;
use roas_report_core::providers::traits::{AdsProvider, SalesProvider};
use roas_report_core::secrets::{
    EnvSecretStore, LayeredSecretStore, MemorySecretStore, SecretKey, SecretStore,
    StoredCredential,
};
use roas_report_core::services::report_service::ReportService;
use roas_report_core::RoasReporter;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Mock Providers
// ═══════════════════════════════════════════════════════════════════

struct MockAdsProvider {
    channel: AdChannel,
    records: Vec<AdMetricRecord>,
    failure: Option<fn() -> CoreError>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl MockAdsProvider {
    fn ok(channel: AdChannel, records: Vec<AdMetricRecord>) -> Self {
        Self {
            channel,
            records,
            failure: None,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failing(channel: AdChannel, failure: fn() -> CoreError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::ok(channel, Vec::new())
        }
    }

    fn slow(channel: AdChannel, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::ok(channel, Vec::new())
        }
    }
}

#[async_trait]
impl AdsProvider for MockAdsProvider {
    fn name(&self) -> &str {
        "MockAds"
    }

    fn channel(&self) -> AdChannel {
        self.channel
    }

    async fn fetch_daily_metrics(
        &self,
        _range: &DateRange,
    ) -> Result<Vec<AdMetricRecord>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(self.records.clone()),
        }
    }
}

struct MockSalesProvider {
    orders: Vec<Order>,
    failure: Option<fn() -> CoreError>,
}

impl MockSalesProvider {
    fn ok(orders: Vec<Order>) -> Self {
        Self {
            orders,
            failure: None,
        }
    }

    fn failing(failure: fn() -> CoreError) -> Self {
        Self {
            orders: Vec::new(),
            failure: Some(failure),
        }
    }
}

#[async_trait]
impl SalesProvider for MockSalesProvider {
    fn name(&self) -> &str {
        "MockSales"
    }

    async fn fetch_orders(&self, _range: &DateRange) -> Result<Vec<Order>, CoreError> {
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(self.orders.clone()),
        }
    }
}

fn order(raw: &str, total: f64) -> Order {
    Order::new(DateTime::parse_from_rfc3339(raw).unwrap(), total)
}

/// Five orders on 2024-01-01 totalling 500.
fn five_orders() -> Vec<Order> {
    (0..5)
        .map(|i| order(&format!("2024-01-01T1{i}:00:00+00:00"), 100.0))
        .collect()
}

fn rate_limited() -> CoreError {
    CoreError::RateLimit {
        provider: "MockAds".into(),
        retry_after_secs: Some(60),
        attempts: 4,
    }
}

fn unauthorized() -> CoreError {
    CoreError::Auth {
        provider: "MockSales".into(),
        message: "HTTP 401 Unauthorized".into(),
    }
}

fn registry(ads: Vec<MockAdsProvider>, sales: Option<MockSalesProvider>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for provider in ads {
        registry.register_ads(Box::new(provider));
    }
    if let Some(sales) = sales {
        registry.set_sales(Box::new(sales));
    }
    registry
}

// ═══════════════════════════════════════════════════════════════════
// ReportService
// ═══════════════════════════════════════════════════════════════════

mod report_service {
    use super::*;

    fn service() -> ReportService {
        ReportService::with_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn complete_report() {
        let ads = MockAdsProvider::ok(
            AdChannel::Meta,
            vec![AdMetricRecord::new(AdChannel::Meta, d(2024, 1, 1), 10_000, 100, 125.0)],
        );
        let registry = registry(vec![ads], Some(MockSalesProvider::ok(five_orders())));
        let report = service()
            .build_report(&DateRange::single_day(d(2024, 1, 1)), &registry)
            .await;

        assert!(report.is_complete());
        assert_eq!(report.summary.total_spend, 125.0);
        assert_eq!(report.summary.total_revenue, 500.0);
        assert_eq!(report.summary.total_orders, 5);
        assert_eq!(report.summary.roas, Some(4.0));
        assert_eq!(report.requested_channels, vec![AdChannel::Meta]);
        assert_eq!(report.channels.len(), 1);
        assert_eq!(report.daily.len(), 1);
    }

    #[tokio::test]
    async fn rate_limited_ads_still_show_sales() {
        let registry = registry(
            vec![MockAdsProvider::failing(AdChannel::Meta, rate_limited)],
            Some(MockSalesProvider::ok(five_orders())),
        );
        let report = service()
            .build_report(&DateRange::single_day(d(2024, 1, 1)), &registry)
            .await;

        assert_eq!(report.summary.total_revenue, 500.0);
        assert_eq!(report.summary.average_order_value, Some(100.0));
        assert_eq!(report.summary.roas, None);

        assert_eq!(report.warnings.len(), 1);
        let warning = &report.warnings[0];
        assert_eq!(warning.source, DataSource::Ads);
        assert_eq!(warning.source.to_string(), "ads");
        assert_eq!(warning.channel, Some(AdChannel::Meta));
        assert_eq!(warning.kind, ErrorKind::RateLimit);

        assert!(!report.is_source_available(DataSource::Ads));
        assert!(report.is_source_available(DataSource::Sales));
    }

    #[tokio::test]
    async fn failed_sales_still_show_ads() {
        let ads = MockAdsProvider::ok(
            AdChannel::Meta,
            vec![AdMetricRecord::spend_only(AdChannel::Meta, d(2024, 1, 1), 80.0)],
        );
        let registry = registry(vec![ads], Some(MockSalesProvider::failing(unauthorized)));
        let report = service()
            .build_report(&DateRange::single_day(d(2024, 1, 1)), &registry)
            .await;

        assert_eq!(report.summary.total_spend, 80.0);
        assert_eq!(report.summary.total_orders, 0);
        assert_eq!(report.summary.average_order_value, None);

        let sales_warnings: Vec<_> = report.warnings_for(DataSource::Sales).collect();
        assert_eq!(sales_warnings.len(), 1);
        assert_eq!(sales_warnings[0].kind, ErrorKind::Auth);
        assert_eq!(sales_warnings[0].channel, None);
    }

    #[tokio::test]
    async fn one_channel_failing_keeps_the_other() {
        let meta = MockAdsProvider::ok(
            AdChannel::Meta,
            vec![AdMetricRecord::spend_only(AdChannel::Meta, d(2024, 1, 1), 50.0)],
        );
        let google = MockAdsProvider::failing(AdChannel::Google, rate_limited);
        let registry = registry(vec![google, meta], Some(MockSalesProvider::ok(five_orders())));
        let report = service()
            .build_report(&DateRange::single_day(d(2024, 1, 1)), &registry)
            .await;

        assert_eq!(report.requested_channels, vec![AdChannel::Meta, AdChannel::Google]);
        assert_eq!(report.summary.total_spend, 50.0);
        assert_eq!(report.summary.roas, Some(10.0));
        assert!(report.is_source_partial(DataSource::Ads));
        assert_eq!(report.warnings[0].label(), "ads (Google)");
    }

    #[tokio::test]
    async fn slow_fetcher_becomes_timeout_warning() {
        let registry = registry(
            vec![MockAdsProvider::slow(AdChannel::Meta, Duration::from_secs(10))],
            Some(MockSalesProvider::ok(five_orders())),
        );
        let service = ReportService::with_timeout(Duration::from_millis(50));
        let report = service
            .build_report(&DateRange::single_day(d(2024, 1, 1)), &registry)
            .await;

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, ErrorKind::Timeout);
        assert_ne!(report.warnings[0].kind, ErrorKind::RateLimit);
        assert_eq!(report.summary.total_revenue, 500.0);
    }

    #[tokio::test]
    async fn fetchers_run_concurrently() {
        let registry = registry(
            vec![
                MockAdsProvider::slow(AdChannel::Meta, Duration::from_millis(300)),
                MockAdsProvider::slow(AdChannel::Google, Duration::from_millis(300)),
            ],
            Some(MockSalesProvider::ok(Vec::new())),
        );
        let started = std::time::Instant::now();
        let report = service()
            .build_report(&DateRange::single_day(d(2024, 1, 1)), &registry)
            .await;

        assert!(report.is_complete());
        assert!(started.elapsed() < Duration::from_millis(550));
    }

    #[tokio::test]
    async fn ensure_complete_turns_warnings_into_partial_data() {
        let registry = registry(
            vec![MockAdsProvider::failing(AdChannel::Meta, rate_limited)],
            Some(MockSalesProvider::ok(five_orders())),
        );
        let report = service()
            .build_report(&DateRange::single_day(d(2024, 1, 1)), &registry)
            .await;

        let err = report.ensure_complete().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartialData);
        assert_eq!(err.to_string(), "Partial data: ads (Meta) failed");
    }

    #[tokio::test]
    async fn out_of_range_records_are_ignored() {
        let ads = MockAdsProvider::ok(
            AdChannel::Meta,
            vec![
                AdMetricRecord::spend_only(AdChannel::Meta, d(2024, 1, 1), 10.0),
                AdMetricRecord::spend_only(AdChannel::Meta, d(2024, 1, 2), 99.0),
            ],
        );
        let registry = registry(vec![ads], Some(MockSalesProvider::ok(Vec::new())));
        let report = service()
            .build_report(&DateRange::single_day(d(2024, 1, 1)), &registry)
            .await;
        assert_eq!(report.summary.total_spend, 10.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// ProviderRegistry
// ═══════════════════════════════════════════════════════════════════

mod provider_registry {
    use super::*;

    #[tokio::test]
    async fn registering_a_channel_twice_replaces_it() {
        let first = MockAdsProvider::ok(AdChannel::Meta, Vec::new());
        let first_calls = first.calls.clone();
        let second = MockAdsProvider::failing(AdChannel::Meta, rate_limited);
        let second_calls = second.calls.clone();

        let mut registry = registry(vec![first], None);
        registry.register_ads(Box::new(second));
        assert_eq!(registry.channels(), vec![AdChannel::Meta]);
        assert!(registry.get_ads_provider(AdChannel::Google).is_none());

        let report = ReportService::with_timeout(Duration::from_secs(5))
            .build_report(&DateRange::single_day(d(2024, 1, 1)), &registry)
            .await;
        assert_eq!(first_calls.load(Ordering::SeqCst), 0);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(!report.sales_requested);
    }

    #[test]
    fn from_credentials_requires_sales() {
        let creds = ReportCredentials {
            meta: Some(MetaCredentials::new("t", "123")),
            ..ReportCredentials::default()
        };
        let result = ProviderRegistry::from_credentials(&creds, &Settings::default());
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn from_credentials_builds_configured_sources() {
        let creds = ReportCredentials {
            meta: Some(MetaCredentials::new("t", "123")),
            shopify: Some(ShopifyCredentials::new("acme", "s")),
            google: None,
        };
        let registry = ProviderRegistry::from_credentials(&creds, &Settings::default()).unwrap();
        assert_eq!(registry.channels(), vec![AdChannel::Meta]);
        assert_eq!(registry.sales_provider().map(|p| p.name()), Some("Shopify"));
        assert_eq!(
            registry.get_ads_provider(AdChannel::Meta).map(|p| p.name()),
            Some("Meta Ads")
        );
    }

    #[test]
    fn bad_account_id_marks_only_that_channel_unusable() {
        let creds = ReportCredentials {
            meta: Some(MetaCredentials::new("t", "act_abc")),
            shopify: Some(ShopifyCredentials::new("acme", "s")),
            google: None,
        };
        let registry = ProviderRegistry::from_credentials(&creds, &Settings::default()).unwrap();

        assert!(registry.get_ads_provider(AdChannel::Meta).is_none());
        assert_eq!(registry.channels(), vec![AdChannel::Meta]);
        assert!(registry.sales_provider().is_some());
        assert_eq!(registry.unusable().len(), 1);
        assert_eq!(registry.unusable()[0].label(), "ads (Meta)");
        assert_eq!(registry.unusable()[0].kind, ErrorKind::Validation);
    }

    #[test]
    fn incomplete_google_group_leaves_meta_usable() {
        let creds = ReportCredentials {
            meta: Some(MetaCredentials::new("t", "123")),
            shopify: Some(ShopifyCredentials::new("acme", "s")),
            google: Some(
                GoogleAdsCredentials::new("", "", "").with_login_customer_id("999-888-7777"),
            ),
        };
        let registry = ProviderRegistry::from_credentials(&creds, &Settings::default()).unwrap();

        assert!(registry.get_ads_provider(AdChannel::Meta).is_some());
        assert!(registry.get_ads_provider(AdChannel::Google).is_none());
        assert_eq!(registry.channels(), vec![AdChannel::Meta, AdChannel::Google]);
        let warning = &registry.unusable()[0];
        assert_eq!(warning.channel, Some(AdChannel::Google));
        assert!(warning.message.contains("Google developer token"));
    }

    #[test]
    fn unusable_sales_still_counts_as_requested() {
        let creds = ReportCredentials {
            meta: Some(MetaCredentials::new("t", "123")),
            shopify: Some(ShopifyCredentials::new("   ", "s")),
            google: None,
        };
        let registry = ProviderRegistry::from_credentials(&creds, &Settings::default()).unwrap();

        assert!(registry.sales_provider().is_none());
        assert!(registry.sales_requested());
        assert_eq!(registry.unusable()[0].source, DataSource::Sales);
    }

    #[tokio::test]
    async fn unusable_sources_become_report_warnings() {
        let creds = ReportCredentials {
            meta: Some(MetaCredentials::new("t", "act_abc")),
            shopify: Some(ShopifyCredentials::new("acme", "s")),
            google: None,
        };
        let mut registry = ProviderRegistry::from_credentials(&creds, &Settings::default()).unwrap();
        registry.set_sales(Box::new(MockSalesProvider::ok(vec![Order::new(
            DateTime::parse_from_rfc3339("2024-01-01T10:00:00+00:00").unwrap(),
            80.0,
        )])));

        let report = ReportService::with_timeout(Duration::from_secs(5))
            .build_report(&DateRange::single_day(d(2024, 1, 1)), &registry)
            .await;

        assert_eq!(report.requested_channels, vec![AdChannel::Meta]);
        assert!(!report.is_source_available(DataSource::Ads));
        assert_eq!(report.summary.total_revenue, 80.0);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, ErrorKind::Validation);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Secret stores
// ═══════════════════════════════════════════════════════════════════

mod secret_store {
    use super::*;

    fn meta_credential(token: &str) -> StoredCredential {
        StoredCredential::MetaAds(MetaCredentials::new(token, "123"))
    }

    #[test]
    fn memory_store_get_put() {
        let store = MemorySecretStore::new();
        let key = SecretKey::new("acme", Platform::MetaAds);
        assert!(store.get(&key).unwrap().is_none());

        store.put(key.clone(), meta_credential("t1")).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(meta_credential("t1")));
        assert_eq!(store.len(), 1);

        let other_client = SecretKey::new("globex", Platform::MetaAds);
        assert!(store.get(&other_client).unwrap().is_none());
    }

    #[test]
    fn memory_store_rejects_platform_mismatch() {
        let store = MemorySecretStore::new();
        let err = store
            .put(SecretKey::new("acme", Platform::Shopify), meta_credential("t"))
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn blank_client_is_default() {
        assert_eq!(SecretKey::new("  ", Platform::Shopify).client, "default");
    }

    #[test]
    fn env_store_requires_complete_groups() {
        let store = EnvSecretStore::from_vars([
            ("ROAS_META_ACCESS_TOKEN", "meta-token"),
            ("ROAS_META_ACCOUNT_ID", "123"),
            ("ROAS_SHOP_DOMAIN", "acme"),
            ("ROAS_SHOP_TOKEN", ""),
            ("ROAS_GOOGLE_DEVELOPER_TOKEN", "dev"),
        ]);
        let creds = store.credentials();
        assert!(creds.meta.is_some());
        assert!(creds.shopify.is_none());
        assert!(creds.google.is_none());

        let key = SecretKey::new("anyone", Platform::MetaAds);
        assert!(matches!(
            store.get(&key).unwrap(),
            Some(StoredCredential::MetaAds(_))
        ));
    }

    #[test]
    fn env_store_is_read_only() {
        let store = EnvSecretStore::from_vars(Vec::<(String, String)>::new());
        let err = store
            .put(SecretKey::new("acme", Platform::MetaAds), meta_credential("t"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn layered_store_prefers_first_layer() {
        let memory = Arc::new(MemorySecretStore::new());
        let env = Arc::new(EnvSecretStore::from_vars([
            ("ROAS_META_ACCESS_TOKEN", "from-env"),
            ("ROAS_META_ACCOUNT_ID", "123"),
        ]));
        let layers: Vec<Arc<dyn SecretStore>> = vec![memory.clone(), env];
        let store = LayeredSecretStore::new(layers);
        let key = SecretKey::new("acme", Platform::MetaAds);

        assert_eq!(store.get(&key).unwrap(), Some(meta_credential("from-env")));

        store.put(key.clone(), meta_credential("from-memory")).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(meta_credential("from-memory")));
        assert_eq!(memory.len(), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
// RoasReporter facade
// ═══════════════════════════════════════════════════════════════════

mod facade {
    use super::*;

    fn reporter() -> RoasReporter {
        RoasReporter::new(Settings::default()).unwrap()
    }

    fn range() -> DateRange {
        DateRange::single_day(d(2024, 1, 1))
    }

    #[test]
    fn rejects_invalid_settings() {
        let settings = Settings {
            max_pages: 0,
            ..Settings::default()
        };
        assert!(matches!(
            RoasReporter::new(settings),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn debug_hides_secret_store() {
        let reporter = reporter();
        let debug = format!("{reporter:?}");
        assert!(debug.starts_with("RoasReporter"));
    }

    #[test]
    fn missing_credentials_are_reported_per_platform() {
        let reporter = reporter();
        let request = ReportRequest::new("acme", range());
        match reporter.resolve_credentials(&request) {
            Err(CoreError::MissingCredential { platform, client }) => {
                assert_eq!(platform, "meta_ads");
                assert_eq!(client, "acme");
            }
            other => panic!("expected MissingCredential, got {other:?}"),
        }

        let request = ReportRequest::new("acme", range()).with_credentials(ReportCredentials {
            meta: Some(MetaCredentials::new("t", "123")),
            ..ReportCredentials::default()
        });
        match reporter.resolve_credentials(&request) {
            Err(CoreError::MissingCredential { platform, .. }) => assert_eq!(platform, "shopify"),
            other => panic!("expected MissingCredential, got {other:?}"),
        }
    }

    #[test]
    fn stored_credentials_fill_gaps_in_the_request() {
        let reporter = reporter();
        reporter
            .store_credentials(
                "acme",
                &ReportCredentials {
                    meta: Some(MetaCredentials::new("stored-meta", "111")),
                    shopify: Some(ShopifyCredentials::new("acme", "stored-shop")),
                    google: None,
                },
            )
            .unwrap();

        let request = ReportRequest::new("acme", range()).with_credentials(ReportCredentials {
            meta: Some(MetaCredentials::new("typed-meta", "222")),
            ..ReportCredentials::default()
        });
        let creds = reporter.resolve_credentials(&request).unwrap();
        assert_eq!(creds.meta.unwrap().access_token.expose(), "typed-meta");
        assert_eq!(creds.shopify.unwrap().access_token.expose(), "stored-shop");

        assert!(matches!(
            reporter.credential("acme", Platform::Shopify),
            Ok(StoredCredential::Shopify(_))
        ));
        assert!(matches!(
            reporter.credential("acme", Platform::GoogleAds),
            Err(CoreError::MissingCredential { .. })
        ));
    }

    #[tokio::test]
    async fn fetch_report_with_custom_registry() {
        let reporter = reporter();
        let registry = registry(
            vec![MockAdsProvider::ok(
                AdChannel::Meta,
                vec![AdMetricRecord::spend_only(AdChannel::Meta, d(2024, 1, 1), 250.0)],
            )],
            Some(MockSalesProvider::ok(five_orders())),
        );
        let report = reporter.fetch_report_with(&range(), &registry).await;
        assert_eq!(report.summary.roas, Some(2.0));
    }

    #[test]
    fn aggregate_pass_through() {
        let summary = reporter().aggregate(
            &range(),
            &[AdMetricRecord::spend_only(AdChannel::Meta, d(2024, 1, 1), 100.0)],
            &[SalesRecord::new(d(2024, 1, 1), 300.0, 3)],
        );
        assert_eq!(summary.roas, Some(3.0));
        assert_eq!(summary.average_order_value, Some(100.0));
    }
}
