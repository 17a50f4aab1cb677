use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::db;
use crate::error::ApiError;
use crate::models::message::{MessageList, MessageSummary, SendRequest, SendResponse};
use crate::smtp;
use crate::AppState;

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub folder: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct FolderQuery {
    pub folder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StarRequest {
    #[serde(default)]
    pub starred: bool,
}

fn folder_or_inbox(folder: &Option<String>) -> String {
    folder
        .as_deref()
        .filter(|f| !f.is_empty())
        .unwrap_or("INBOX")
        .to_string()
}

pub async fn list_emails(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<MessageList>, ApiError> {
    let folder = folder_or_inbox(&q.folder);
    let limit = q.limit.unwrap_or(DEFAULT_LIMIT);
    let offset = q.offset.unwrap_or(0);

    match state
        .store
        .list_messages(&claims.username, &folder, limit, offset)
        .await
    {
        Ok(list) => Ok(Json(list)),
        // Read path: directory or filesystem trouble degrades to an empty
        // listing rather than a 500.
        Err(ApiError::Dependency(e)) => {
            tracing::warn!(error = %e, folder, "listing degraded to empty");
            Ok(Json(MessageList {
                emails: Vec::new(),
                total: 0,
                folder,
            }))
        }
        Err(e) => Err(e),
    }
}

pub async fn get_email(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<u64>,
    Query(q): Query<FolderQuery>,
) -> Result<Json<MessageSummary>, ApiError> {
    let folder = folder_or_inbox(&q.folder);
    let msg = state
        .store
        .get_message(&claims.username, &folder, id)
        .await?;
    Ok(Json(msg))
}

pub async fn send_email(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    headers: HeaderMap,
    Json(req): Json<SendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let to = req.to.as_deref().unwrap_or("");
    let subject = req.subject.as_deref().unwrap_or("");
    if to.is_empty() || subject.is_empty() {
        return Err(ApiError::validation("To and subject are required"));
    }
    let body = req.body.as_deref().unwrap_or("");

    let mail = smtp::OutboundMail {
        from: &claims.username,
        to,
        cc: req.cc.as_deref(),
        bcc: req.bcc.as_deref(),
        subject,
        body,
    };
    let (message, message_id) =
        smtp::build_email(&mail).map_err(|_| ApiError::validation("Invalid recipient address"))?;

    if !state.config.demo_mode {
        // Per-request sender credential passthrough; a relay that trusts the
        // connector needs none.
        let credentials = headers
            .get("x-email-password")
            .and_then(|v| v.to_str().ok())
            .map(|p| (claims.username.clone(), p.to_string()));

        // lettre's transport is blocking; keep it off the runtime threads
        let host = state.config.smtp_host.clone();
        let port = state.config.smtp_port;
        tokio::task::spawn_blocking(move || {
            let credentials = credentials
                .as_ref()
                .map(|(user, pass)| (user.as_str(), pass.as_str()));
            smtp::send(&host, port, credentials, &message)
        })
        .await
        .map_err(|e| ApiError::Dependency(e.into()))??;

        // Best-effort audit; never fails the request.
        db::audit_sent(&state.pool, &claims.username, to, subject).await;
    }

    tracing::info!(from = %claims.username, to, subject, "email sent");
    Ok(Json(SendResponse {
        message: "Email sent successfully".to_string(),
        message_id,
    }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<u64>,
    Query(q): Query<FolderQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let folder = folder_or_inbox(&q.folder);
    state.store.mark_read(&claims.username, &folder, id).await?;
    Ok(Json(serde_json::json!({ "message": "Email marked as read" })))
}

pub async fn toggle_star(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<u64>,
    Query(q): Query<FolderQuery>,
    Json(req): Json<StarRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let folder = folder_or_inbox(&q.folder);
    state
        .store
        .set_starred(&claims.username, &folder, id, req.starred)
        .await?;
    Ok(Json(
        serde_json::json!({ "message": "Email star status updated" }),
    ))
}

pub async fn delete_email(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<u64>,
    Query(q): Query<FolderQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let folder = folder_or_inbox(&q.folder);
    state
        .store
        .delete_message(&claims.username, &folder, id)
        .await?;
    Ok(Json(
        serde_json::json!({ "message": "Email deleted successfully" }),
    ))
}
