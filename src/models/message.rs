use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One message as shown in a listing or detail view. Built transiently per
/// request by parsing a maildir file; the id is the 1-based position in the
/// mtime-sorted folder listing and is not stable across scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: u64,
    pub sender: String,
    pub email: String,
    pub subject: String,
    pub snippet: String,
    pub body: String,
    pub date: DateTime<Utc>,
    pub unread: bool,
    pub starred: bool,
    pub folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageList {
    pub emails: Vec<MessageSummary>,
    pub total: usize,
    pub folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSummary {
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub count: usize,
}

impl FolderSummary {
    pub fn new(name: &str, display_name: &str, count: usize) -> Self {
        FolderSummary {
            name: name.to_string(),
            display_name: display_name.to_string(),
            count,
        }
    }
}

/// The five standard folders, served with zero counts whenever the maildir
/// root cannot be enumerated.
pub fn fallback_folders() -> Vec<FolderSummary> {
    vec![
        FolderSummary::new("INBOX", "Inbox", 0),
        FolderSummary::new("Sent", "Sent", 0),
        FolderSummary::new("Drafts", "Drafts", 0),
        FolderSummary::new("Trash", "Trash", 0),
        FolderSummary::new("Junk", "Spam", 0),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub bcc: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    pub message: String,
    #[serde(rename = "messageId")]
    pub message_id: String,
}
