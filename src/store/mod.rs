pub mod demo;
pub mod maildir_store;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::message::{FolderSummary, MessageList, MessageSummary};

/// Read/write interface the connector routes are written against. Selected
/// once at startup: the real maildir-backed store, or the synthetic demo
/// store.
#[async_trait]
pub trait MailStore: Send + Sync {
    async fn list_messages(
        &self,
        username: &str,
        folder: &str,
        limit: usize,
        offset: usize,
    ) -> Result<MessageList, ApiError>;

    async fn get_message(
        &self,
        username: &str,
        folder: &str,
        id: u64,
    ) -> Result<MessageSummary, ApiError>;

    async fn mark_read(&self, username: &str, folder: &str, id: u64) -> Result<(), ApiError>;

    async fn set_starred(
        &self,
        username: &str,
        folder: &str,
        id: u64,
        starred: bool,
    ) -> Result<(), ApiError>;

    async fn delete_message(&self, username: &str, folder: &str, id: u64)
        -> Result<(), ApiError>;

    async fn list_folders(&self, username: &str) -> Result<Vec<FolderSummary>, ApiError>;
}
