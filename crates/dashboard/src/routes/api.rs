use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use roas_report_core::models::report::Report;
use serde::Deserialize;

use crate::error::AppError;
use crate::form::ReportForm;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    /// Fail with 502 instead of returning a report with warnings
    #[serde(default)]
    pub strict: bool,
}

/// POST /api/report?strict=true
///
/// Same fields as the form, as JSON. Returns the full report; undefined
/// ratios are `null`.
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportParams>,
    Json(form): Json<ReportForm>,
) -> Result<Json<Report>, AppError> {
    let request = form.into_request()?;
    let report = if params.strict {
        state.reporter.fetch_complete_report(&request).await?
    } else {
        state.reporter.fetch_report(&request).await?
    };
    Ok(Json(report))
}
