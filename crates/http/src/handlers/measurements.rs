use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::api_error::ApiError;
use crate::api_types::{AddMeasurementRequest, AddMeasurementResponse, MeasurementView};
use crate::AppState;

pub async fn add_measurement(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddMeasurementRequest>,
) -> Result<Json<AddMeasurementResponse>, ApiError> {
    let value = req
        .value
        .as_f64()
        .ok_or_else(|| ApiError::BadRequest("value must be a number".to_owned()))?;
    let id = state.measurements.add(value, req.note).await?;
    Ok(Json(AddMeasurementResponse { id, success: true }))
}

pub async fn list_measurements(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MeasurementView>>, ApiError> {
    let rows = state.measurements.list().await?;
    Ok(Json(rows.into_iter().map(MeasurementView::from).collect()))
}
