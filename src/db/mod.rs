use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use crate::models::mailbox::MailboxRecord;

/// Lazy pool against the vmail database: nothing is dialled until the first
/// directory lookup, so demo mode runs without a reachable MySQL.
pub fn connect_lazy(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(5)
        .connect_lazy(database_url)
}

/// Look up one row from the iRedMail `mailbox` table. The directory is
/// read-only to this service.
pub async fn find_mailbox(
    pool: &MySqlPool,
    username: &str,
) -> Result<Option<MailboxRecord>, sqlx::Error> {
    sqlx::query_as::<_, MailboxRecord>(
        "SELECT username, password, name, domain, active, enablesmtp, enableimap, \
         quota, storagebasedirectory, storagenode, maildir, created \
         FROM mailbox WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

/// Best-effort audit record for an outbound send. The events table may not
/// exist in a given deployment; failures are logged and swallowed, never
/// surfaced to the caller.
pub async fn audit_sent(pool: &MySqlPool, mailbox: &str, peer: &str, subject: &str) {
    let ts = chrono::Utc::now().timestamp();
    let res = sqlx::query(
        "INSERT INTO connector_events (direction, mailbox, peer, subject, ts) \
         VALUES ('OUT', ?, ?, ?, ?)",
    )
    .bind(mailbox)
    .bind(peer)
    .bind(subject)
    .bind(ts)
    .execute(pool)
    .await;

    if let Err(e) = res {
        tracing::debug!(error = %e, "audit log write skipped");
    }
}
