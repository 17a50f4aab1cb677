use axum::extract::State;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::mailbox::UserProfile;
use crate::services::user_service;
use crate::AppState;

pub async fn user_info(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    let profile =
        user_service::user_info(&state.pool, state.config.demo_mode, &claims.username).await?;
    Ok(Json(profile))
}
