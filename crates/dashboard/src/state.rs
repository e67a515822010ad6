use roas_report_core::models::credentials::ReportCredentials;
use roas_report_core::RoasReporter;

/// Shared application state available to all route handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Builds reports; resolves credentials the form leaves blank through its
    /// secret store.
    pub reporter: RoasReporter,

    /// Placeholder credentials from the environment. Only the non-secret parts
    /// (account ids, shop domain) are shown in the form.
    pub defaults: ReportCredentials,
}
