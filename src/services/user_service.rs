use sqlx::MySqlPool;

use crate::db;
use crate::error::ApiError;
use crate::models::mailbox::UserProfile;
use crate::store::demo;

pub async fn user_info(
    pool: &MySqlPool,
    demo_mode: bool,
    username: &str,
) -> Result<UserProfile, ApiError> {
    if demo_mode {
        return Ok(demo::demo_profile());
    }
    let record = db::find_mailbox(pool, username)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(record.into())
}
