use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::config::Config;
use crate::db;
use crate::error::ApiError;
use crate::maildir;
use crate::models::message::{FolderSummary, MessageList, MessageSummary};
use crate::store::MailStore;

/// The real store: resolves the user's maildir via the mailbox directory,
/// then works directly on the filesystem. Scans are synchronous within the
/// request; nothing is cached.
pub struct MaildirStore {
    pool: MySqlPool,
    config: Config,
}

impl MaildirStore {
    pub fn new(pool: MySqlPool, config: Config) -> Self {
        MaildirStore { pool, config }
    }

    async fn maildir_root(&self, username: &str) -> Result<PathBuf, ApiError> {
        let record = db::find_mailbox(&self.pool, username)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok(maildir::resolve_maildir(&self.config, &record))
    }
}

#[async_trait]
impl MailStore for MaildirStore {
    async fn list_messages(
        &self,
        username: &str,
        folder: &str,
        limit: usize,
        offset: usize,
    ) -> Result<MessageList, ApiError> {
        let root = self.maildir_root(username).await?;
        let (emails, total) = maildir::list_messages(&root, folder, limit, offset);
        Ok(MessageList {
            emails,
            total,
            folder: folder.to_string(),
        })
    }

    async fn get_message(
        &self,
        username: &str,
        folder: &str,
        id: u64,
    ) -> Result<MessageSummary, ApiError> {
        let root = self.maildir_root(username).await?;
        maildir::get_message(&root, folder, id)
            .ok_or_else(|| ApiError::not_found("Email not found"))
    }

    async fn mark_read(&self, username: &str, folder: &str, id: u64) -> Result<(), ApiError> {
        let root = self.maildir_root(username).await?;
        maildir::mark_read(&root, folder, id)
    }

    async fn set_starred(
        &self,
        username: &str,
        folder: &str,
        id: u64,
        starred: bool,
    ) -> Result<(), ApiError> {
        let root = self.maildir_root(username).await?;
        maildir::set_starred(&root, folder, id, starred)
    }

    async fn delete_message(
        &self,
        username: &str,
        folder: &str,
        id: u64,
    ) -> Result<(), ApiError> {
        let root = self.maildir_root(username).await?;
        maildir::delete_message(&root, folder, id)
    }

    async fn list_folders(&self, username: &str) -> Result<Vec<FolderSummary>, ApiError> {
        let root = self.maildir_root(username).await?;
        Ok(maildir::list_folders(&root))
    }
}
