use sqlx::MySqlPool;

use crate::auth::password::PasswordVerifier;
use crate::auth::AuthKeys;
use crate::db;
use crate::error::ApiError;
use crate::models::mailbox::{AuthUserInfo, LoginResponse};
use crate::store::demo;

/// Login composition: directory lookup, service-flag invariant, password
/// verification, token issue. Bad credentials and disabled services are
/// indistinguishable to the caller.
pub async fn login(
    pool: &MySqlPool,
    verifier: &PasswordVerifier,
    keys: &AuthKeys,
    demo_mode: bool,
    email: &str,
    password: &str,
) -> Result<LoginResponse, ApiError> {
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::validation("Email and password required"));
    }

    if demo_mode {
        let user = demo::demo_user();
        let token = keys.issue(&user.username, &user.name, &user.domain)?;
        return Ok(LoginResponse { token, user });
    }

    let record = db::find_mailbox(pool, email)
        .await?
        .ok_or_else(|| ApiError::auth("Invalid credentials"))?;

    if !record.can_login() {
        return Err(ApiError::auth("Invalid credentials"));
    }
    if !verifier.verify(password, &record.password).await {
        return Err(ApiError::auth("Invalid credentials"));
    }

    let token = keys.issue(&record.username, &record.name, &record.domain)?;
    Ok(LoginResponse {
        token,
        user: AuthUserInfo {
            username: record.username,
            name: record.name,
            domain: record.domain,
        },
    })
}
