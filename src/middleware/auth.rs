use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use uuid::Uuid;

use crate::session::{SessionStore, SESSION_COOKIE};

/// Session gate ahead of every route except login/logout.
///
/// Requests without a session cookie resolving to an authenticated session
/// are redirected to the login form, carrying the originally requested path
/// as the continuation parameter. On success the session snapshot (including
/// its database credentials) is injected into the request extensions.
pub async fn require_session(mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    let Some(id) = session_id_from_headers(request.headers()) else {
        return redirect_to_login(&path);
    };
    let Some(current) = SessionStore::instance().authenticated(id).await else {
        return redirect_to_login(&path);
    };

    request.extensions_mut().insert(current);
    next.run(request).await
}

fn redirect_to_login(path: &str) -> Response {
    Redirect::to(&format!("/login?next={}", path)).into_response()
}

/// Extract the session id from the Cookie header, if present and well-formed.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name.trim() == SESSION_COOKIE {
            Uuid::parse_str(value.trim()).ok()
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn finds_session_cookie_among_others() {
        let id = Uuid::new_v4();
        let headers =
            headers_with_cookie(&format!("theme=dark; {}={}; lang=en", SESSION_COOKIE, id));
        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn missing_or_malformed_cookie_yields_none() {
        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);

        let headers = headers_with_cookie("theme=dark");
        assert_eq!(session_id_from_headers(&headers), None);

        let headers = headers_with_cookie(&format!("{}=not-a-uuid", SESSION_COOKIE));
        assert_eq!(session_id_from_headers(&headers), None);
    }
}
