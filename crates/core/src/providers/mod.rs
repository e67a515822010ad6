pub mod de;
pub mod http;
pub mod registry;
pub mod traits;

// API provider implementations
pub mod google_ads;
pub mod meta_ads;
pub mod shopify;
