use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row from the iRedMail `mailbox` table. Read-only to this system; the
/// directory is owned by the mail server.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MailboxRecord {
    pub username: String,
    #[serde(skip)] // never serialize the password scheme string
    pub password: String,
    pub name: String,
    pub domain: String,
    pub active: bool,
    pub enablesmtp: bool,
    pub enableimap: bool,
    pub quota: i64,
    pub storagebasedirectory: Option<String>,
    pub storagenode: Option<String>,
    pub maildir: String,
    pub created: Option<NaiveDateTime>,
}

impl MailboxRecord {
    /// A mailbox may authenticate only when it is active and both SMTP and
    /// IMAP service flags are enabled.
    pub fn can_login(&self) -> bool {
        self.active && self.enablesmtp && self.enableimap
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUserInfo {
    pub username: String,
    pub name: String,
    pub domain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthUserInfo,
}

/// Profile fields exposed by `GET /api/protected/user/info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub name: String,
    pub domain: String,
    pub quota: i64,
    pub created: Option<NaiveDateTime>,
}

impl From<MailboxRecord> for UserProfile {
    fn from(r: MailboxRecord) -> Self {
        UserProfile {
            username: r.username,
            name: r.name,
            domain: r.domain,
            quota: r.quota,
            created: r.created,
        }
    }
}
