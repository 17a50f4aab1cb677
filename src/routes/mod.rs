pub mod auth;
pub mod emails;
pub mod folders;
pub mod user;

use axum::response::{Html, IntoResponse};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::AppState;

async fn root_page() -> impl IntoResponse {
    Html(include_str!("../../static/app.html"))
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/", get(root_page))
        .nest_service("/static", ServeDir::new("static"))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/protected/emails", get(emails::list_emails))
        .route("/api/protected/emails/send", post(emails::send_email))
        .route(
            "/api/protected/emails/:id",
            get(emails::get_email).delete(emails::delete_email),
        )
        .route("/api/protected/emails/:id/read", put(emails::mark_read))
        .route("/api/protected/emails/:id/star", put(emails::toggle_star))
        .route("/api/protected/folders", get(folders::list_folders))
        .route("/api/protected/user/info", get(user::user_info))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
