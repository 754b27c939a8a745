use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use vitalog_service::{ExportOutcome, ImportOutcome, RestoreOutcome};

use crate::api_error::ApiError;
use crate::AppState;

pub async fn export_backup(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ExportOutcome>, ApiError> {
    let outcome = state.backup.export_snapshot().await?;
    Ok(Json(outcome))
}

pub async fn restore_backup(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RestoreOutcome>, ApiError> {
    let outcome = state.backup.run_startup_restore().await?;
    Ok(Json(outcome))
}

/// Accepts one uploaded artifact (structured record sequence or raw
/// snapshot) as the first multipart field that carries a file name.
pub async fn upload_artifact(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ImportOutcome>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(ToOwned::to_owned) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
        let outcome = state.backup.import_artifact(&file_name, bytes.to_vec()).await?;
        return Ok(Json(outcome));
    }
    Err(ApiError::BadRequest("no file attached".to_owned()))
}
