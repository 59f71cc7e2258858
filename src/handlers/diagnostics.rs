//! Smoke tests for the database-side triggers and stored procedures. These
//! endpoints deliberately attempt known-bad writes and report whether the
//! database rejected them.

use axum::extract::Path;
use axum::response::{Html, Json, Redirect};
use axum::Extension;
use chrono::Local;
use serde_json::{json, Value};

use super::{fetch_count, flash, take_flashes};
use crate::database::{executor, QueryError, SqlParam};
use crate::session::{CurrentSession, Flash};
use crate::view;

const DUPLICATE_STUDENT_SQL: &str =
    "INSERT INTO Student (Student_ID, Name, Email, Department, Year_of_Study) VALUES (?, ?, ?, ?, ?)";
const BAD_RATING_SQL: &str =
    "INSERT INTO Feedback (Feedback_ID, Alumni_ID, Student_ID, Rating, Date) VALUES (?, ?, ?, ?, ?)";
const LOGGED_FEEDBACK_SQL: &str =
    "INSERT INTO Feedback (Feedback_ID, Alumni_ID, Student_ID, Rating, Date, Comments) VALUES (?, ?, ?, ?, ?, ?)";
const LOG_COUNT_SQL: &str =
    "SELECT COUNT(*) AS count FROM Feedback_Log WHERE Alumni_ID = ? AND Student_ID = ?";

/// GET /test/triggers
pub async fn triggers_page(Extension(session): Extension<CurrentSession>) -> Html<String> {
    let flashes = take_flashes(&session).await;
    let body = format!(
        "<p>Each button attempts a write the database should handle itself.</p>\n\
         <ul>\n\
         <li>{} duplicate student email, expected to be blocked</li>\n\
         <li>{} feedback rating of 6, expected to be blocked</li>\n\
         <li>{} valid feedback, expected to appear in Feedback_Log</li>\n\
         </ul>\n",
        view::inline_post_form("/test/email_uniqueness", "Test email uniqueness"),
        view::inline_post_form("/test/rating_validation", "Test rating validation"),
        view::inline_post_form("/test/auto_logging", "Test auto logging"),
    );
    view::page("Trigger Tests", &flashes, &body)
}

/// POST /test/email_uniqueness - inserts a student with an email already
/// present in the seed data. The verdict comes from the error category, not
/// from matching message text.
pub async fn email_uniqueness(Extension(session): Extension<CurrentSession>) -> Redirect {
    let params = [
        SqlParam::from("TEST_EMAIL"),
        SqlParam::from("Test Student"),
        SqlParam::from("john.doe@example.com"),
        SqlParam::from("CS"),
        SqlParam::Int(2),
    ];

    let verdict = match executor::execute(&session.credentials, DUPLICATE_STUDENT_SQL, &params).await
    {
        Ok(_) => Flash::error("❌ Email uniqueness trigger FAILED - duplicate email was allowed"),
        Err(QueryError::Constraint { .. }) => {
            Flash::success("✅ Email uniqueness trigger WORKED - duplicate email blocked")
        }
        Err(e) => Flash::warning(format!("⚠️ Unexpected error: {}", e)),
    };
    flash(&session, verdict).await;
    Redirect::to("/test/triggers")
}

/// POST /test/rating_validation - inserts feedback with rating 6.
pub async fn rating_validation(Extension(session): Extension<CurrentSession>) -> Redirect {
    let params = [
        SqlParam::from("TEST_RATING"),
        SqlParam::from("ALUM001"),
        SqlParam::from("STU001"),
        SqlParam::Int(6),
        SqlParam::from(Local::now().date_naive()),
    ];

    let verdict = match executor::execute(&session.credentials, BAD_RATING_SQL, &params).await {
        Ok(_) => Flash::error("❌ Rating validation trigger FAILED - invalid rating (6) was allowed"),
        Err(QueryError::Constraint { .. }) => {
            Flash::success("✅ Rating validation trigger WORKED - invalid rating (6) blocked")
        }
        Err(e) => Flash::warning(format!("⚠️ Unexpected error: {}", e)),
    };
    flash(&session, verdict).await;
    Redirect::to("/test/triggers")
}

/// POST /test/auto_logging - inserts valid feedback, then checks that the
/// audit trigger wrote a matching Feedback_Log row.
pub async fn auto_logging(Extension(session): Extension<CurrentSession>) -> Redirect {
    let params = [
        SqlParam::from("TEST_AUTO_LOG"),
        SqlParam::from("ALUM001"),
        SqlParam::from("STU001"),
        SqlParam::Int(5),
        SqlParam::from(Local::now().date_naive()),
        SqlParam::from("Test auto logging"),
    ];

    let verdict = match executor::execute(&session.credentials, LOGGED_FEEDBACK_SQL, &params).await
    {
        Ok(_) => {
            let logged = fetch_count(
                &session.credentials,
                LOG_COUNT_SQL,
                &[SqlParam::from("ALUM001"), SqlParam::from("STU001")],
            )
            .await;
            match logged {
                Ok(count) if count > 0 => Flash::success(
                    "✅ Auto-logging trigger WORKED - feedback was automatically logged",
                ),
                Ok(_) => Flash::error("❌ Auto-logging trigger FAILED - feedback was not logged"),
                Err(e) => Flash::warning(format!("⚠️ Error testing auto-logging: {}", e)),
            }
        }
        Err(e) => Flash::warning(format!("⚠️ Error testing auto-logging: {}", e)),
    };
    flash(&session, verdict).await;
    Redirect::to("/test/triggers")
}

/// GET /test/procedures
pub async fn procedures_page(Extension(session): Extension<CurrentSession>) -> Html<String> {
    let flashes = take_flashes(&session).await;
    let body = "<p>Each button invokes a stored procedure with canned test \
         parameters via <code>POST /api/procedures/&lt;name&gt;</code> and \
         returns a JSON envelope.</p>\n\
         <ul>\n\
         <li><code>RegisterStudent</code></li>\n\
         <li><code>ScheduleSession</code></li>\n\
         <li><code>SubmitFeedback</code></li>\n\
         </ul>\n"
        .to_string();
    view::page("Procedure Tests", &flashes, &body)
}

/// POST /api/procedures/:name - JSON envelope, 200 either way.
pub async fn api_procedure(
    Extension(session): Extension<CurrentSession>,
    Path(name): Path<String>,
) -> Json<Value> {
    let Some(params) = procedure_fixture(&name) else {
        return Json(json!({
            "success": false,
            "error": format!("unknown procedure: {}", name),
        }));
    };

    match executor::call_procedure(&session.credentials, &name, &params).await {
        Ok(rows) => Json(json!({ "success": true, "data": rows })),
        Err(e) => Json(json!({ "success": false, "error": e.to_string() })),
    }
}

/// Canned test parameter sets for the schema's stored procedures.
fn procedure_fixture(name: &str) -> Option<Vec<SqlParam>> {
    match name {
        "RegisterStudent" => Some(vec![
            SqlParam::from("STU999"),
            SqlParam::from("Test User"),
            SqlParam::Int(9876543210),
            SqlParam::from("test@pes.edu"),
            SqlParam::from("CSE"),
            SqlParam::Int(2),
        ]),
        "ScheduleSession" => Some(vec![
            SqlParam::from("SES100"),
            SqlParam::from("PESALU001"),
            SqlParam::from("STU999"),
            SqlParam::from("2025-11-05"),
            SqlParam::Int(60),
            SqlParam::from("Career Guidance"),
        ]),
        "SubmitFeedback" => Some(vec![
            SqlParam::from("FDB100"),
            SqlParam::from("PESALU001"),
            SqlParam::from("STU999"),
            SqlParam::Int(5),
            SqlParam::from("2025-11-05"),
            SqlParam::from("Great session"),
        ]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_exist_only_for_known_procedures() {
        assert_eq!(procedure_fixture("RegisterStudent").map(|p| p.len()), Some(6));
        assert_eq!(procedure_fixture("ScheduleSession").map(|p| p.len()), Some(6));
        assert_eq!(procedure_fixture("SubmitFeedback").map(|p| p.len()), Some(6));
        assert!(procedure_fixture("DropEverything").is_none());
        assert!(procedure_fixture("").is_none());
    }

    #[test]
    fn register_student_fixture_uses_numeric_phone_and_year() {
        let params = procedure_fixture("RegisterStudent").unwrap();
        assert_eq!(params[2], SqlParam::Int(9876543210));
        assert_eq!(params[5], SqlParam::Int(2));
    }
}
