use roas_report_core::models::settings::Settings;
use serde::Deserialize;

/// Dashboard configuration, read from `ROAS_*` environment variables
/// (and a `.env` file, if present).
///
/// Default credential placeholders are not part of this struct; they are
/// read by `EnvSecretStore` so they never end up in a `Debug` dump.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_json: bool,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub max_pages: u32,
    pub meta_base_url: Option<String>,
    pub google_ads_base_url: Option<String>,
    pub shopify_base_url: Option<String>,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        Self::load(config::Environment::with_prefix("ROAS"))
    }

    pub fn load(environment: config::Environment) -> Result<Self, config::ConfigError> {
        let defaults = Settings::default();
        let config = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("log_level", "info")?
            .set_default("log_json", false)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("max_retries", defaults.max_retries)?
            .set_default("retry_base_delay_ms", defaults.retry_base_delay_ms)?
            .set_default("retry_max_delay_ms", defaults.retry_max_delay_ms)?
            .set_default("max_pages", defaults.max_pages)?
            .add_source(environment.try_parsing(true))
            .build()?;

        config.try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Fetch settings for the core library; API versions keep their defaults.
    pub fn settings(&self) -> Settings {
        Settings {
            request_timeout_secs: self.request_timeout_secs,
            max_retries: self.max_retries,
            retry_base_delay_ms: self.retry_base_delay_ms,
            retry_max_delay_ms: self.retry_max_delay_ms.max(self.retry_base_delay_ms),
            max_pages: self.max_pages,
            meta_base_url: non_empty(&self.meta_base_url),
            google_ads_base_url: non_empty(&self.google_ads_base_url),
            shopify_base_url: non_empty(&self.shopify_base_url),
            ..Settings::default()
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
