use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt; // for `app.oneshot()`

use iredmail_connector::config::Config;
use iredmail_connector::{routes, AppState};

fn demo_config() -> Config {
    Config {
        db_host: "localhost".into(),
        db_port: 3306,
        db_user: "vmail".into(),
        db_password: String::new(),
        db_name: "vmail".into(),
        smtp_host: "localhost".into(),
        smtp_port: 587,
        storage_base: "/var/vmail".into(),
        storage_node: "vmail1".into(),
        jwt_secret: "integration-test-secret".into(),
        port: 0,
        demo_mode: true,
        doveadm_path: "doveadm".into(),
        doveadm_timeout: std::time::Duration::from_secs(1),
    }
}

fn demo_app() -> Router {
    // Demo mode: the lazy pool never dials MySQL.
    routes::app(AppState::from_config(demo_config()).unwrap())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login_token(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"email":"demo@fusionmail.com","password":"demo"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["token"].as_str().unwrap().to_string()
}

fn authed(method: &str, uri: &str, token: &str, body: Option<&str>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json");
    builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_default())
        .unwrap()
}

#[tokio::test]
async fn login_requires_both_fields() {
    let app = demo_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email":"demo@fusionmail.com"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_issues_token_for_demo_user() {
    let app = demo_app();
    let token = login_token(&app).await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = demo_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/protected/emails")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_token_is_forbidden() {
    let app = demo_app();
    let response = app
        .oneshot(authed("GET", "/api/protected/emails", "bogus.token", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn lists_inbox_messages() {
    let app = demo_app();
    let token = login_token(&app).await;
    let response = app
        .clone()
        .oneshot(authed("GET", "/api/protected/emails", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["folder"], "INBOX");
    assert!(json["total"].as_u64().unwrap() > 0);
    assert!(!json["emails"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn paging_is_honored() {
    let app = demo_app();
    let token = login_token(&app).await;
    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            "/api/protected/emails?folder=INBOX&limit=5&offset=5",
            &token,
            None,
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["emails"].as_array().unwrap().len(), 5);
    assert_eq!(json["total"].as_u64().unwrap(), 35);
}

#[tokio::test]
async fn message_detail_and_missing_id() {
    let app = demo_app();
    let token = login_token(&app).await;

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/protected/emails/1", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], 1);
    assert!(json["body"].as_str().is_some());

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/protected/emails/9999", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn folders_include_the_standard_set() {
    let app = demo_app();
    let token = login_token(&app).await;
    let response = app
        .clone()
        .oneshot(authed("GET", "/api/protected/folders", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let names: Vec<&str> = json["folders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["INBOX", "Sent", "Drafts", "Trash", "Junk"]);
}

#[tokio::test]
async fn send_requires_to_and_subject() {
    let app = demo_app();
    let token = login_token(&app).await;
    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/protected/emails/send",
            &token,
            Some(r#"{"to":"bob@y.com"}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn send_succeeds_in_demo_mode() {
    let app = demo_app();
    let token = login_token(&app).await;
    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/protected/emails/send",
            &token,
            Some(r#"{"to":"bob@y.com","subject":"Hi","body":"Hello"}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["messageId"].as_str().unwrap().contains('@'));
}

#[tokio::test]
async fn flag_mutations_round_trip() {
    let app = demo_app();
    let token = login_token(&app).await;

    let response = app
        .clone()
        .oneshot(authed("PUT", "/api/protected/emails/1/read", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            "/api/protected/emails/1/star",
            &token,
            Some(r#"{"starred":true}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/protected/emails/1", &token, None))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["unread"], false);
    assert_eq!(json["starred"], true);

    let response = app
        .clone()
        .oneshot(authed("DELETE", "/api/protected/emails/1", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn user_info_and_logout() {
    let app = demo_app();
    let token = login_token(&app).await;

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/protected/user/info", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["username"], "demo@fusionmail.com");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
