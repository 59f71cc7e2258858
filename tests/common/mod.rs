#![allow(dead_code)]

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use mentor_portal_api::app;
use mentor_portal_api::database::DbCredentials;
use mentor_portal_api::session::{SessionStore, SESSION_COOKIE};

static ENV: OnceLock<()> = OnceLock::new();

/// Router wired exactly as the binary serves it, with the database pointed at
/// a host that cannot resolve so connection attempts fail fast instead of
/// finding a real server.
pub fn test_app() -> Router {
    ENV.get_or_init(|| {
        std::env::set_var("PORTAL_DB_HOST", "database.invalid");
    });
    app()
}

/// Create an authenticated session directly in the store and return the
/// Cookie header value that selects it.
pub async fn session_cookie() -> String {
    let id = SessionStore::instance()
        .create_authenticated("root".to_string(), DbCredentials::new("root", "root"))
        .await;
    format!("{}={}", SESSION_COOKIE, id)
}

pub async fn get(app: Router, path: &str) -> Response {
    let request = Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request");
    app.oneshot(request).await.expect("response")
}

pub async fn get_with_cookie(app: Router, path: &str, cookie: &str) -> Response {
    let request = Request::builder()
        .uri(path)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .expect("request");
    app.oneshot(request).await.expect("response")
}

pub async fn post_form(
    app: Router,
    path: &str,
    body: &str,
    cookie: Option<&str>,
) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = builder.body(Body::from(body.to_string())).expect("request");
    app.oneshot(request).await.expect("response")
}

pub async fn body_string(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
