use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use vitalog_core::{build_report, now, Report};

use crate::AppState;

/// The renderer would rather draw an empty report than an error page, so a
/// failed read degrades to the empty-state report instead of a 500.
pub async fn get_report(State(state): State<Arc<AppState>>) -> Json<Report> {
    match state.reports.generate().await {
        Ok(report) => Json(report),
        Err(e) => {
            tracing::error!(error = %e, "report generation failed, serving empty state");
            Json(build_report(&[], now()))
        },
    }
}
