use axum::extract::Path;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use serde::Deserialize;

use super::{flash, id_name_options, row_text, take_flashes, ALUMNI_OPTIONS_SQL, STUDENT_OPTIONS_SQL};
use crate::database::{executor, DbCredentials, RowMap, SqlParam};
use crate::session::{CurrentSession, Flash};
use crate::view;

const LIST_SQL: &str = "SELECT ms.Session_ID, ms.Session_Date, ms.Duration_Minutes, ms.Topic, \
            a.Name AS Alumni_Name, s.Name AS Student_Name \
     FROM MentorshipSession ms \
     JOIN Alumni a ON ms.Alumni_ID = a.Alumni_ID \
     JOIN Student s ON ms.Student_ID = s.Student_ID \
     ORDER BY ms.Session_Date DESC";
const GET_SQL: &str = "SELECT * FROM MentorshipSession WHERE Session_ID = ?";
const INSERT_SQL: &str = "INSERT INTO MentorshipSession (Session_ID, Alumni_ID, Student_ID, Session_Date, \
     Duration_Minutes, Topic) VALUES (?, ?, ?, ?, ?, ?)";
const UPDATE_SQL: &str = "UPDATE MentorshipSession SET Alumni_ID = ?, Student_ID = ?, Session_Date = ?, \
     Duration_Minutes = ?, Topic = ? WHERE Session_ID = ?";
const DELETE_SQL: &str = "DELETE FROM MentorshipSession WHERE Session_ID = ?";

#[derive(Debug, Deserialize)]
pub struct SessionForm {
    pub session_id: String,
    pub alumni_id: String,
    pub student_id: String,
    pub session_date: String,
    pub duration: String,
    pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionUpdate {
    pub alumni_id: String,
    pub student_id: String,
    pub session_date: String,
    pub duration: String,
    pub topic: String,
}

/// GET /sessions
pub async fn list(Extension(session): Extension<CurrentSession>) -> Html<String> {
    let mut flashes = take_flashes(&session).await;
    let rows = match executor::fetch_all(&session.credentials, LIST_SQL, &[]).await {
        Ok(rows) => rows,
        Err(e) => {
            flashes.push(Flash::error(format!("Error loading sessions: {}", e)));
            Vec::new()
        }
    };

    let table = view::rows_table_with_actions(&rows, &|row: &RowMap| {
        let id = row_text(row, "Session_ID");
        format!(
            "{} {}",
            view::link(&format!("/sessions/edit/{}", id), "Edit"),
            view::inline_post_form(&format!("/sessions/delete/{}", id), "Delete")
        )
    });
    let body = format!("{}\n<p>{}</p>\n", table, view::link("/sessions/add", "Add session"));
    view::page("Mentorship Sessions", &flashes, &body)
}

/// GET /sessions/add
pub async fn add_form(Extension(session): Extension<CurrentSession>) -> Html<String> {
    let flashes = take_flashes(&session).await;
    let body = form_body(&session.credentials, "/sessions/add", &FormValues::empty(), false).await;
    view::page("Add Session", &flashes, &body)
}

/// POST /sessions/add
pub async fn add_submit(
    Extension(session): Extension<CurrentSession>,
    Form(form): Form<SessionForm>,
) -> Response {
    let params = [
        SqlParam::from(form.session_id.clone()),
        SqlParam::from(form.alumni_id.clone()),
        SqlParam::from(form.student_id.clone()),
        SqlParam::from(form.session_date.clone()),
        SqlParam::from(form.duration.clone()),
        SqlParam::from(form.topic.clone()),
    ];

    match executor::execute(&session.credentials, INSERT_SQL, &params).await {
        Ok(_) => {
            flash(&session, Flash::success("Session added successfully!")).await;
            Redirect::to("/sessions").into_response()
        }
        Err(e) => {
            let flashes = [Flash::error(format!("Error adding session: {}", e))];
            let body = form_body(
                &session.credentials,
                "/sessions/add",
                &FormValues::from_form(&form),
                false,
            )
            .await;
            view::page("Add Session", &flashes, &body).into_response()
        }
    }
}

/// GET /sessions/edit/:id
pub async fn edit_form(
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> Response {
    let found =
        executor::fetch_all(&session.credentials, GET_SQL, &[SqlParam::from(id.clone())]).await;
    match found {
        Ok(rows) => match rows.first() {
            Some(row) => {
                let flashes = take_flashes(&session).await;
                let body = form_body(
                    &session.credentials,
                    &format!("/sessions/edit/{}", id),
                    &FormValues::from_row(row),
                    true,
                )
                .await;
                view::page("Edit Session", &flashes, &body).into_response()
            }
            None => {
                flash(&session, Flash::error("Session not found!")).await;
                Redirect::to("/sessions").into_response()
            }
        },
        Err(e) => {
            flash(&session, Flash::error(format!("Error loading session: {}", e))).await;
            Redirect::to("/sessions").into_response()
        }
    }
}

/// POST /sessions/edit/:id
pub async fn edit_submit(
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
    Form(form): Form<SessionUpdate>,
) -> Response {
    let params = [
        SqlParam::from(form.alumni_id.clone()),
        SqlParam::from(form.student_id.clone()),
        SqlParam::from(form.session_date.clone()),
        SqlParam::from(form.duration.clone()),
        SqlParam::from(form.topic.clone()),
        SqlParam::from(id.clone()),
    ];

    match executor::execute(&session.credentials, UPDATE_SQL, &params).await {
        Ok(_) => {
            flash(&session, Flash::success("Session updated successfully!")).await;
            Redirect::to("/sessions").into_response()
        }
        Err(e) => {
            let flashes = [Flash::error(format!("Error updating session: {}", e))];
            let body = form_body(
                &session.credentials,
                &format!("/sessions/edit/{}", id),
                &FormValues::from_update(&id, &form),
                true,
            )
            .await;
            view::page("Edit Session", &flashes, &body).into_response()
        }
    }
}

/// POST /sessions/delete/:id
pub async fn delete(
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> Redirect {
    match executor::execute(&session.credentials, DELETE_SQL, &[SqlParam::from(id)]).await {
        Ok(0) => flash(&session, Flash::error("Insufficient privileges.")).await,
        Ok(n) => {
            flash(
                &session,
                Flash::success(format!(
                    "Session deleted successfully! ({} record(s) removed)",
                    n
                )),
            )
            .await
        }
        Err(e) => flash(&session, Flash::error(format!("Error deleting session: {}", e))).await,
    }
    Redirect::to("/sessions")
}

struct FormValues {
    session_id: String,
    alumni_id: String,
    student_id: String,
    session_date: String,
    duration: String,
    topic: String,
}

impl FormValues {
    fn empty() -> Self {
        Self {
            session_id: String::new(),
            alumni_id: String::new(),
            student_id: String::new(),
            session_date: String::new(),
            duration: String::new(),
            topic: String::new(),
        }
    }

    fn from_row(row: &RowMap) -> Self {
        Self {
            session_id: row_text(row, "Session_ID"),
            alumni_id: row_text(row, "Alumni_ID"),
            student_id: row_text(row, "Student_ID"),
            session_date: row_text(row, "Session_Date"),
            duration: row_text(row, "Duration_Minutes"),
            topic: row_text(row, "Topic"),
        }
    }

    fn from_form(form: &SessionForm) -> Self {
        Self {
            session_id: form.session_id.clone(),
            alumni_id: form.alumni_id.clone(),
            student_id: form.student_id.clone(),
            session_date: form.session_date.clone(),
            duration: form.duration.clone(),
            topic: form.topic.clone(),
        }
    }

    fn from_update(id: &str, form: &SessionUpdate) -> Self {
        Self {
            session_id: id.to_string(),
            alumni_id: form.alumni_id.clone(),
            student_id: form.student_id.clone(),
            session_date: form.session_date.clone(),
            duration: form.duration.clone(),
            topic: form.topic.clone(),
        }
    }
}

// The alumni/student dropdowns are fetched fresh for every form render,
// including failed-submit re-renders.
async fn form_body(
    credentials: &DbCredentials,
    action: &str,
    values: &FormValues,
    editing: bool,
) -> String {
    let alumni = id_name_options(credentials, ALUMNI_OPTIONS_SQL).await;
    let students = id_name_options(credentials, STUDENT_OPTIONS_SQL).await;

    let mut fields = String::new();
    if !editing {
        fields.push_str(&view::text_input("Session ID", "session_id", &values.session_id));
    }
    fields.push_str(&view::select_input("Alumni", "alumni_id", &alumni, &values.alumni_id));
    fields.push_str(&view::select_input(
        "Student",
        "student_id",
        &students,
        &values.student_id,
    ));
    fields.push_str(&view::text_input(
        "Session date",
        "session_date",
        &values.session_date,
    ));
    fields.push_str(&view::text_input("Duration (minutes)", "duration", &values.duration));
    fields.push_str(&view::text_input("Topic", "topic", &values.topic));
    view::form(
        action,
        if editing { "Update session" } else { "Add session" },
        &fields,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_values_map_session_columns() {
        let mut row = RowMap::new();
        row.insert("Session_ID".into(), json!("SES100"));
        row.insert("Alumni_ID".into(), json!("ALUM001"));
        row.insert("Student_ID".into(), json!("STU001"));
        row.insert("Session_Date".into(), json!("2025-11-05"));
        row.insert("Duration_Minutes".into(), json!(60));
        row.insert("Topic".into(), json!("Career Guidance"));

        let values = FormValues::from_row(&row);
        assert_eq!(values.session_date, "2025-11-05");
        assert_eq!(values.duration, "60");
    }
}
