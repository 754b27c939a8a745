//! HTTP API server for vitalog.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(unreachable_pub, reason = "pub items are re-exported")]
#![allow(clippy::absolute_paths, reason = "Explicit paths for clarity")]
#![allow(unused_results, reason = "Some results are intentionally ignored")]
#![allow(missing_copy_implementations, reason = "Types may grow")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::min_ident_chars, reason = "Short closure params are idiomatic")]
#![allow(clippy::exhaustive_structs, reason = "HTTP types are stable")]

pub mod api_error;
mod api_types;
mod handlers;

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use vitalog_service::{BackupService, MeasurementService, ReportService};
use vitalog_storage::BackendInfo;

use crate::api_error::ApiError;
use crate::api_types::HealthResponse;

pub use api_types::{AddMeasurementRequest, AddMeasurementResponse, MeasurementView};

/// Shared application state for all HTTP handlers.
///
/// Services are wrapped in `Arc` so the backup scheduler and the router can
/// share them.
pub struct AppState {
    pub measurements: Arc<MeasurementService>,
    pub reports: Arc<ReportService>,
    pub backup: Arc<BackupService>,
    /// Which backend the resolver picked, for diagnostics.
    pub backend: BackendInfo,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/measurement", post(handlers::measurements::add_measurement))
        .route("/api/measurements", get(handlers::measurements::list_measurements))
        .route("/api/report", get(handlers::reports::get_report))
        .route("/api/backup/export", post(handlers::backup::export_backup))
        .route("/api/backup/restore", post(handlers::backup::restore_backup))
        .route("/api/backup/upload", post(handlers::backup::upload_artifact))
        .route("/admin/status", get(handlers::admin::get_status))
        .route("/admin/seed", post(handlers::admin::seed_test_data))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    let records = state.measurements.count().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        records,
        backend: state.backend.kind,
    }))
}
