use axum::extract::State;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::message::fallback_folders;
use crate::AppState;

/// Folder listing absorbs every failure into the fixed fallback set; it is
/// never an error to the client.
pub async fn list_folders(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let folders = match state.store.list_folders(&claims.username).await {
        Ok(folders) => folders,
        Err(e) => {
            tracing::warn!(error = %e, "folder listing degraded to fallback set");
            fallback_folders()
        }
    };
    Ok(Json(serde_json::json!({ "folders": folders })))
}
