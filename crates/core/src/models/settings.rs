use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::CoreError;

/// Runtime knobs for fetching. Built once at startup and shared by all requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Upper bound for a whole fetcher call, and for each HTTP request inside it.
    pub request_timeout_secs: u64,

    /// Retries after the first attempt on throttling or transient failures.
    pub max_retries: u32,

    /// First backoff delay; doubles per attempt.
    pub retry_base_delay_ms: u64,

    /// Ceiling for a single backoff delay.
    pub retry_max_delay_ms: u64,

    /// Pagination budget per fetcher call. Exceeding it is an error, not a short result.
    pub max_pages: u32,

    pub meta_api_version: String,
    pub google_ads_api_version: String,
    pub shopify_api_version: String,

    /// Base URL overrides (proxies, sandboxes, tests). `None` uses the public endpoint.
    pub meta_base_url: Option<String>,
    pub google_ads_base_url: Option<String>,
    pub shopify_base_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 8_000,
            max_pages: 100,
            meta_api_version: "v18.0".to_string(),
            google_ads_api_version: "v17".to_string(),
            shopify_api_version: "2023-04".to_string(),
            meta_base_url: None,
            google_ads_base_url: None,
            shopify_base_url: None,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(CoreError::Config("max_pages must be greater than zero".into()));
        }
        if self.retry_max_delay_ms < self.retry_base_delay_ms {
            return Err(CoreError::Config(format!(
                "retry_max_delay_ms ({}) must not be below retry_base_delay_ms ({})",
                self.retry_max_delay_ms, self.retry_base_delay_ms
            )));
        }
        for (label, version) in [
            ("meta_api_version", &self.meta_api_version),
            ("google_ads_api_version", &self.google_ads_api_version),
            ("shopify_api_version", &self.shopify_api_version),
        ] {
            if version.trim().is_empty() {
                return Err(CoreError::Config(format!("{label} must not be empty")));
            }
        }
        Ok(())
    }
}
