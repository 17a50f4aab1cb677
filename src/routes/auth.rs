use axum::extract::State;
use axum::Json;

use crate::error::ApiError;
use crate::models::mailbox::{LoginRequest, LoginResponse};
use crate::services::auth_service;
use crate::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = req.email.as_deref().unwrap_or("");
    let password = req.password.as_deref().unwrap_or("");
    let resp = auth_service::login(
        &state.pool,
        &state.verifier,
        &state.keys,
        state.config.demo_mode,
        email,
        password,
    )
    .await?;
    tracing::info!(user = %resp.user.username, "login succeeded");
    Ok(Json(resp))
}

/// Tokens are never revoked server-side; logout is a client-side credential
/// discard and this endpoint only acknowledges it.
pub async fn logout() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Logged out successfully" }))
}
