pub mod ad_metrics;
pub mod credentials;
pub mod date_range;
pub mod report;
pub mod sales;
pub mod settings;
pub mod summary;
