use std::sync::Arc;

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::Html;
use chrono::Local;
use tracing::{info, warn};

use crate::form::{FormView, ReportForm};
use crate::render;
use crate::state::AppState;

/// GET /
///
/// The empty form, covering the last 30 days.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let view = FormView::initial(&state.defaults, Local::now().date_naive());
    Html(render::form_page(&view, None))
}

/// POST /report
///
/// Fetch and render a report. Failed sources show up as warnings on the
/// page; a bad request re-renders the form with the error.
pub async fn submit_report(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ReportForm>,
) -> (StatusCode, Html<String>) {
    let view = FormView::submitted(&form, &state.defaults);

    let request = match form.into_request() {
        Ok(request) => request,
        Err(e) => {
            info!(error = %e, "report form rejected");
            return (
                StatusCode::BAD_REQUEST,
                Html(render::form_page(&view, Some(&e.to_string()))),
            );
        }
    };

    match state.reporter.fetch_report(&request).await {
        Ok(report) => (StatusCode::OK, Html(render::report_page(&report, &view))),
        Err(e) => {
            warn!(kind = %e.kind(), error = %e, "report request failed");
            (
                StatusCode::BAD_REQUEST,
                Html(render::form_page(&view, Some(&e.to_string()))),
            )
        }
    }
}
