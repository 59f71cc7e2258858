use axum::extract::Query;
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::database::{executor, DbCredentials};
use crate::middleware::auth::session_id_from_headers;
use crate::session::{Flash, SessionStore, SESSION_COOKIE};
use crate::view;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// GET /login
pub async fn login_page(Query(query): Query<LoginQuery>, headers: HeaderMap) -> Html<String> {
    // An anonymous session may be carrying the post-logout flash.
    let flashes = match session_id_from_headers(&headers) {
        Some(id) => SessionStore::instance().take_flashes(id).await,
        None => Vec::new(),
    };
    let next = query.next.unwrap_or_else(|| "/".to_string());
    view::page("Login", &flashes, &login_body(&next, ""))
}

/// POST /login
///
/// The credentials are verified by opening an actual database connection
/// with them; success stores them in a new session. The failure message
/// never distinguishes bad credentials from an unreachable server.
pub async fn login_submit(Form(form): Form<LoginForm>) -> Response {
    let username = form.username.trim().to_string();
    let target = form
        .next
        .filter(|next| !next.is_empty())
        .unwrap_or_else(|| "/".to_string());
    let credentials = DbCredentials::new(username.clone(), form.password);

    match executor::verify(&credentials).await {
        Ok(()) => {
            let store = SessionStore::instance();
            let id = store.create_authenticated(username, credentials).await;
            store
                .push_flash(id, Flash::success("Logged in successfully"))
                .await;
            (
                [(header::SET_COOKIE, session_cookie(id))],
                Redirect::to(&target),
            )
                .into_response()
        }
        Err(e) => {
            warn!("failed login attempt for user {}: {}", username, e);
            let flashes = [Flash::error(
                "Invalid credentials or database connection failed",
            )];
            view::page("Login", &flashes, &login_body(&target, &username)).into_response()
        }
    }
}

/// GET /logout
pub async fn logout(headers: HeaderMap) -> Response {
    let store = SessionStore::instance();
    if let Some(id) = session_id_from_headers(&headers) {
        store.remove(id).await;
    }

    // Fresh anonymous session so the login page can show the flash.
    let anonymous = store.create_anonymous().await;
    store
        .push_flash(anonymous, Flash::success("Logged out"))
        .await;
    (
        [(header::SET_COOKIE, session_cookie(anonymous))],
        Redirect::to("/login"),
    )
        .into_response()
}

fn login_body(next: &str, username: &str) -> String {
    let fields = format!(
        "{}<label>Password <input type=\"password\" name=\"password\"></label><br>\n\
         <input type=\"hidden\" name=\"next\" value=\"{}\">\n",
        view::text_input("Username", "username", username),
        view::escape(next),
    );
    view::form("/login", "Log in", &fields)
}

fn session_cookie(id: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_scoped_and_http_only() {
        let id = Uuid::new_v4();
        let cookie = session_cookie(id);
        assert!(cookie.starts_with(&format!("{}={}", SESSION_COOKIE, id)));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn login_form_carries_continuation_path() {
        let body = login_body("/alumni", "root");
        assert!(body.contains("name=\"next\" value=\"/alumni\""));
        assert!(body.contains("name=\"username\" value=\"root\""));
        assert!(body.contains("type=\"password\""));
    }
}
