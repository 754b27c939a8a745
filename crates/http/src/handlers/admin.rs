use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use vitalog_core::TIMESTAMP_FORMAT;

use crate::api_error::ApiError;
use crate::api_types::{SeedResponse, StatusResponse};
use crate::AppState;

pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let rows = state.measurements.list().await?;
    // rows arrive newest-first
    let format = |m: &vitalog_core::Measurement| m.created_at.format(TIMESTAMP_FORMAT).to_string();
    Ok(Json(StatusResponse {
        backend: state.backend.clone(),
        records: rows.len() as u64,
        first: rows.last().map(format),
        last: rows.first().map(format),
    }))
}

pub async fn seed_test_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SeedResponse>, ApiError> {
    let rows = state.measurements.seed_test_data().await?;
    Ok(Json(SeedResponse { rows, success: true }))
}
