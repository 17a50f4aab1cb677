use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use crate::error::ApiError;
use crate::models::mailbox::{AuthUserInfo, UserProfile};
use crate::models::message::{FolderSummary, MessageList, MessageSummary};
use crate::store::MailStore;

const SENDERS: &[(&str, &str)] = &[
    ("John Smith", "john@company.com"),
    ("Sarah Johnson", "sarah@startup.io"),
    ("GitHub", "noreply@github.com"),
    ("LinkedIn", "notifications@linkedin.com"),
    ("Team Lead", "lead@company.com"),
    ("HR Department", "hr@company.com"),
    ("Support Team", "support@service.com"),
    ("Newsletter", "news@techblog.com"),
];

const SUBJECTS: &[&str] = &[
    "Weekly Team Meeting Notes",
    "Project Update - Q4 Goals",
    "Your order has been shipped",
    "Security Alert: New login detected",
    "Welcome to our platform!",
    "Invoice #12345 - Payment Due",
    "Meeting Reminder: Tomorrow 2PM",
    "New features available now",
    "Password reset request",
    "Monthly Newsletter - Tech Updates",
];

const SNIPPETS: &[&str] = &[
    "Hi there! I wanted to follow up on our conversation from yesterday...",
    "Please find attached the documents you requested. Let me know if you need...",
    "Thank you for your recent purchase. Your order is being processed and will...",
    "We noticed a new login to your account from an unrecognized device...",
    "Welcome aboard! We're excited to have you join our community...",
    "Your monthly invoice is ready. Please review the charges and submit...",
    "Just a friendly reminder about our meeting scheduled for tomorrow...",
    "We've just released some exciting new features that we think you'll love...",
];

const EXTRA_FOLDERS: &[&str] = &["Sent", "Drafts", "Trash", "Junk"];

pub fn demo_user() -> AuthUserInfo {
    AuthUserInfo {
        username: "demo@fusionmail.com".into(),
        name: "Demo User".into(),
        domain: "fusionmail.com".into(),
    }
}

pub fn demo_profile() -> UserProfile {
    let u = demo_user();
    UserProfile {
        username: u.username,
        name: u.name,
        domain: u.domain,
        quota: 1024,
        created: None,
    }
}

/// In-memory synthetic mailbox. Deterministic content so UI walkthroughs and
/// tests see the same data; mutations apply to the in-memory set only.
pub struct DemoStore {
    messages: Mutex<Vec<MessageSummary>>,
}

impl Default for DemoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoStore {
    pub fn new() -> Self {
        let now = Utc::now();
        let messages = (0..50)
            .map(|i| {
                let (sender, email) = SENDERS[i % SENDERS.len()];
                let snippet = SNIPPETS[i % SNIPPETS.len()];
                let folder = if i < 35 {
                    "INBOX"
                } else {
                    EXTRA_FOLDERS[(i - 35) % EXTRA_FOLDERS.len()]
                };
                MessageSummary {
                    id: (i + 1) as u64,
                    sender: sender.to_string(),
                    email: email.to_string(),
                    subject: SUBJECTS[i % SUBJECTS.len()].to_string(),
                    snippet: snippet.to_string(),
                    body: format!("{snippet}\n\nBest regards,\n{sender}"),
                    date: now - Duration::hours(5 * i as i64),
                    unread: i % 3 == 0,
                    starred: i % 8 == 0,
                    folder: folder.to_string(),
                }
            })
            .collect();
        DemoStore {
            messages: Mutex::new(messages),
        }
    }
}

#[async_trait]
impl MailStore for DemoStore {
    async fn list_messages(
        &self,
        _username: &str,
        folder: &str,
        limit: usize,
        offset: usize,
    ) -> Result<MessageList, ApiError> {
        let messages = self.messages.lock().await;
        let mut matching: Vec<MessageSummary> = messages
            .iter()
            .filter(|m| m.folder.eq_ignore_ascii_case(folder))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date));
        let total = matching.len();
        let emails = matching.into_iter().skip(offset).take(limit).collect();
        Ok(MessageList {
            emails,
            total,
            folder: folder.to_string(),
        })
    }

    async fn get_message(
        &self,
        _username: &str,
        _folder: &str,
        id: u64,
    ) -> Result<MessageSummary, ApiError> {
        self.messages
            .lock()
            .await
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Email not found"))
    }

    async fn mark_read(&self, _username: &str, _folder: &str, id: u64) -> Result<(), ApiError> {
        let mut messages = self.messages.lock().await;
        let msg = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| ApiError::not_found("Email not found"))?;
        msg.unread = false;
        Ok(())
    }

    async fn set_starred(
        &self,
        _username: &str,
        _folder: &str,
        id: u64,
        starred: bool,
    ) -> Result<(), ApiError> {
        let mut messages = self.messages.lock().await;
        let msg = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| ApiError::not_found("Email not found"))?;
        msg.starred = starred;
        Ok(())
    }

    async fn delete_message(
        &self,
        _username: &str,
        _folder: &str,
        id: u64,
    ) -> Result<(), ApiError> {
        let mut messages = self.messages.lock().await;
        let pos = messages
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| ApiError::not_found("Email not found"))?;
        if messages[pos].folder.eq_ignore_ascii_case("Trash") {
            messages.remove(pos);
        } else {
            messages[pos].folder = "Trash".to_string();
        }
        Ok(())
    }

    async fn list_folders(&self, _username: &str) -> Result<Vec<FolderSummary>, ApiError> {
        let messages = self.messages.lock().await;
        let unread = |name: &str| {
            messages
                .iter()
                .filter(|m| m.folder.eq_ignore_ascii_case(name) && m.unread)
                .count()
        };
        let mut folders = vec![FolderSummary::new("INBOX", "Inbox", unread("INBOX"))];
        for name in EXTRA_FOLDERS {
            let display = if *name == "Junk" { "Spam" } else { name };
            folders.push(FolderSummary::new(name, display, unread(name)));
        }
        Ok(folders)
    }
}
