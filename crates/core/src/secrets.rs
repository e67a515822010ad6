//! Credential lookup by (client, platform).
//!
//! Fetchers never read credentials from the UI directly: the facade resolves
//! them through a [`SecretStore`], so the backing store (process memory,
//! environment placeholders, an external vault) can change without touching
//! the providers.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::CoreError;
use crate::models::credentials::{
    GoogleAdsCredentials, MetaCredentials, Platform, ReportCredentials, ShopifyCredentials,
};

/// Client used when the operator does not name one.
pub const DEFAULT_CLIENT: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretKey {
    pub client: String,
    pub platform: Platform,
}

/// Trimmed client name; blank means [`DEFAULT_CLIENT`].
pub fn client_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_CLIENT.to_string()
    } else {
        trimmed.to_string()
    }
}

impl SecretKey {
    pub fn new(client: &str, platform: Platform) -> Self {
        Self {
            client: client_name(client),
            platform,
        }
    }
}

/// A stored credential set for one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum StoredCredential {
    MetaAds(MetaCredentials),
    GoogleAds(GoogleAdsCredentials),
    Shopify(ShopifyCredentials),
}

impl StoredCredential {
    pub fn platform(&self) -> Platform {
        match self {
            StoredCredential::MetaAds(_) => Platform::MetaAds,
            StoredCredential::GoogleAds(_) => Platform::GoogleAds,
            StoredCredential::Shopify(_) => Platform::Shopify,
        }
    }
}

/// Get/put capability over credentials keyed by client and platform.
pub trait SecretStore: Send + Sync {
    fn get(&self, key: &SecretKey) -> Result<Option<StoredCredential>, CoreError>;

    fn put(&self, key: SecretKey, credential: StoredCredential) -> Result<(), CoreError>;
}

fn check_platform(key: &SecretKey, credential: &StoredCredential) -> Result<(), CoreError> {
    if key.platform != credential.platform() {
        return Err(CoreError::ValidationError(format!(
            "credential for {} cannot be stored under {}",
            credential.platform(),
            key.platform
        )));
    }
    Ok(())
}

/// Process-local store. Contents vanish with the process.
#[derive(Default)]
pub struct MemorySecretStore {
    entries: RwLock<HashMap<SecretKey, StoredCredential>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &SecretKey) -> Result<Option<StoredCredential>, CoreError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: SecretKey, credential: StoredCredential) -> Result<(), CoreError> {
        check_platform(&key, &credential)?;
        debug!(client = %key.client, platform = %key.platform, "credential stored");
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, credential);
        Ok(())
    }
}

/// Read-only placeholder credentials, shared by every client.
///
/// Built from environment-style variables (`ROAS_META_ACCESS_TOKEN`, ...). A
/// platform is present only when all its required variables are non-empty.
pub struct EnvSecretStore {
    credentials: ReportCredentials,
}

impl EnvSecretStore {
    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into().trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        let get = |name: &str| vars.get(name).cloned();

        let meta = match (get("ROAS_META_ACCESS_TOKEN"), get("ROAS_META_ACCOUNT_ID")) {
            (Some(token), Some(account)) => Some(MetaCredentials::new(token, account)),
            _ => None,
        };
        let shopify = match (get("ROAS_SHOP_DOMAIN"), get("ROAS_SHOP_TOKEN")) {
            (Some(domain), Some(token)) => Some(ShopifyCredentials::new(domain, token)),
            _ => None,
        };
        let google = match (
            get("ROAS_GOOGLE_DEVELOPER_TOKEN"),
            get("ROAS_GOOGLE_ACCESS_TOKEN"),
            get("ROAS_GOOGLE_CUSTOMER_ID"),
        ) {
            (Some(dev), Some(access), Some(customer)) => {
                let creds = GoogleAdsCredentials::new(dev, access, customer);
                Some(match get("ROAS_GOOGLE_LOGIN_CUSTOMER_ID") {
                    Some(login) => creds.with_login_customer_id(login),
                    None => creds,
                })
            }
            _ => None,
        };

        Self {
            credentials: ReportCredentials {
                meta,
                shopify,
                google,
            },
        }
    }

    /// The placeholders, e.g. to pre-fill the dashboard form.
    pub fn credentials(&self) -> &ReportCredentials {
        &self.credentials
    }
}

impl SecretStore for EnvSecretStore {
    fn get(&self, key: &SecretKey) -> Result<Option<StoredCredential>, CoreError> {
        Ok(match key.platform {
            Platform::MetaAds => self.credentials.meta.clone().map(StoredCredential::MetaAds),
            Platform::GoogleAds => self
                .credentials
                .google
                .clone()
                .map(StoredCredential::GoogleAds),
            Platform::Shopify => self.credentials.shopify.clone().map(StoredCredential::Shopify),
        })
    }

    fn put(&self, _key: SecretKey, _credential: StoredCredential) -> Result<(), CoreError> {
        Err(CoreError::Config(
            "environment credentials are read-only".into(),
        ))
    }
}

/// Looks keys up layer by layer; writes go to the first layer.
pub struct LayeredSecretStore {
    layers: Vec<Arc<dyn SecretStore>>,
}

impl LayeredSecretStore {
    pub fn new(layers: Vec<Arc<dyn SecretStore>>) -> Self {
        Self { layers }
    }
}

impl SecretStore for LayeredSecretStore {
    fn get(&self, key: &SecretKey) -> Result<Option<StoredCredential>, CoreError> {
        for layer in &self.layers {
            if let Some(found) = layer.get(key)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn put(&self, key: SecretKey, credential: StoredCredential) -> Result<(), CoreError> {
        match self.layers.first() {
            Some(layer) => layer.put(key, credential),
            None => Err(CoreError::Config("secret store has no layers".into())),
        }
    }
}

/// Store every platform present in `credentials` under `client`.
pub fn store_credentials(
    store: &dyn SecretStore,
    client: &str,
    credentials: &ReportCredentials,
) -> Result<(), CoreError> {
    if let Some(meta) = &credentials.meta {
        store.put(
            SecretKey::new(client, Platform::MetaAds),
            StoredCredential::MetaAds(meta.clone()),
        )?;
    }
    if let Some(google) = &credentials.google {
        store.put(
            SecretKey::new(client, Platform::GoogleAds),
            StoredCredential::GoogleAds(google.clone()),
        )?;
    }
    if let Some(shopify) = &credentials.shopify {
        store.put(
            SecretKey::new(client, Platform::Shopify),
            StoredCredential::Shopify(shopify.clone()),
        )?;
    }
    Ok(())
}

/// Collect whatever the store holds for `client`. Missing platforms stay `None`.
pub fn load_credentials(
    store: &dyn SecretStore,
    client: &str,
) -> Result<ReportCredentials, CoreError> {
    let mut credentials = ReportCredentials::default();
    for platform in [Platform::MetaAds, Platform::GoogleAds, Platform::Shopify] {
        match store.get(&SecretKey::new(client, platform))? {
            Some(StoredCredential::MetaAds(c)) => credentials.meta = Some(c),
            Some(StoredCredential::GoogleAds(c)) => credentials.google = Some(c),
            Some(StoredCredential::Shopify(c)) => credentials.shopify = Some(c),
            None => {}
        }
    }
    Ok(credentials)
}
