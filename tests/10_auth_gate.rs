mod common;

use anyhow::Result;
use axum::http::{header, StatusCode};

#[tokio::test]
async fn protected_paths_redirect_to_login_with_continuation() -> Result<()> {
    for path in [
        "/",
        "/dashboard",
        "/connections",
        "/alumni",
        "/students",
        "/sessions",
        "/feedback",
        "/alumni/achievements",
        "/test/triggers",
        "/test/procedures",
    ] {
        let response = common::get(common::test_app(), path).await;
        assert_eq!(
            response.status(),
            StatusCode::SEE_OTHER,
            "expected redirect for {}",
            path
        );
        assert_eq!(common::location(&response), format!("/login?next={}", path));
    }
    Ok(())
}

#[tokio::test]
async fn login_page_renders_without_a_session() -> Result<()> {
    let response = common::get(common::test_app(), "/login?next=/students").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_string(response).await;
    assert!(body.contains("name=\"username\""));
    assert!(body.contains("name=\"password\""));
    assert!(body.contains("name=\"next\" value=\"/students\""));
    Ok(())
}

#[tokio::test]
async fn failed_login_rerenders_with_generic_error() -> Result<()> {
    let response = common::post_form(
        common::test_app(),
        "/login",
        "username=root&password=root&next=/alumni",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_string(response).await;
    assert!(body.contains("Invalid credentials or database connection failed"));
    // The form is repopulated for another attempt.
    assert!(body.contains("name=\"username\" value=\"root\""));
    assert!(body.contains("name=\"next\" value=\"/alumni\""));
    Ok(())
}

#[tokio::test]
async fn logout_flash_shows_on_the_next_login_page() -> Result<()> {
    let response = common::get(common::test_app(), "/logout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/login");

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("logout sets a session cookie")
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("portal_session="));

    let login = common::get_with_cookie(common::test_app(), "/login", &cookie).await;
    let body = common::body_string(login).await;
    assert!(body.contains("Logged out"));

    // Flashes are one-shot: a reload no longer shows it.
    let again = common::get_with_cookie(common::test_app(), "/login", &cookie).await;
    let body = common::body_string(again).await;
    assert!(!body.contains("Logged out"));
    Ok(())
}

#[tokio::test]
async fn stale_session_cookie_still_redirects() -> Result<()> {
    let cookie = "portal_session=4f5cdf9e-0000-0000-0000-000000000000";
    let response = common::get_with_cookie(common::test_app(), "/alumni", cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/login?next=/alumni");
    Ok(())
}
