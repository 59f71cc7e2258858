//! Portal behavior that is observable without a reachable database: failed
//! queries render as errors (never as empty success), write failures flash
//! and redirect, and the procedure API rejects unknown names up front.

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn list_page_distinguishes_failure_from_empty() -> Result<()> {
    let cookie = common::session_cookie().await;

    let response = common::get_with_cookie(common::test_app(), "/alumni", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_string(response).await;
    assert!(body.contains("Error loading alumni"));
    assert!(body.contains("No records found."));
    Ok(())
}

#[tokio::test]
async fn dashboard_renders_zero_counts_with_error_flash() -> Result<()> {
    let cookie = common::session_cookie().await;

    let response = common::get_with_cookie(common::test_app(), "/dashboard", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_string(response).await;
    assert!(body.contains("Alumni: 0"));
    assert!(body.contains("Mentorship sessions: 0"));
    assert!(body.contains("Error loading dashboard"));
    Ok(())
}

#[tokio::test]
async fn failed_delete_flashes_and_redirects_to_list() -> Result<()> {
    let cookie = common::session_cookie().await;

    let response =
        common::post_form(common::test_app(), "/students/delete/S1", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/students");

    let list = common::get_with_cookie(common::test_app(), "/students", &cookie).await;
    let body = common::body_string(list).await;
    assert!(body.contains("Error deleting student"));
    Ok(())
}

#[tokio::test]
async fn failed_edit_lookup_redirects_with_flash() -> Result<()> {
    let cookie = common::session_cookie().await;

    let response =
        common::get_with_cookie(common::test_app(), "/alumni/edit/ALUM001", &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/alumni");
    Ok(())
}

#[tokio::test]
async fn unknown_procedure_is_rejected_without_touching_the_database() -> Result<()> {
    let cookie = common::session_cookie().await;

    let response = common::post_form(
        common::test_app(),
        "/api/procedures/DropEverything",
        "",
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&common::body_string(response).await)?;
    assert_eq!(body["success"], Value::Bool(false));
    assert!(body["error"].as_str().unwrap().contains("unknown procedure"));
    Ok(())
}

#[tokio::test]
async fn known_procedure_reports_connection_failure_in_envelope() -> Result<()> {
    let cookie = common::session_cookie().await;

    let response = common::post_form(
        common::test_app(),
        "/api/procedures/RegisterStudent",
        "",
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&common::body_string(response).await)?;
    assert_eq!(body["success"], Value::Bool(false));
    assert!(body["error"].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn trigger_test_reports_unexpected_error_when_database_is_down() -> Result<()> {
    let cookie = common::session_cookie().await;

    let response = common::post_form(
        common::test_app(),
        "/test/email_uniqueness",
        "",
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&response), "/test/triggers");

    let page = common::get_with_cookie(common::test_app(), "/test/triggers", &cookie).await;
    let body = common::body_string(page).await;
    // A connection failure is not a trigger verdict in either direction.
    assert!(body.contains("Unexpected error"));
    assert!(!body.contains("WORKED"));
    assert!(!body.contains("FAILED"));
    Ok(())
}
