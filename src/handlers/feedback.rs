use axum::extract::{Path, Query};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use serde::Deserialize;

use super::{flash, id_name_options, row_text, take_flashes, ALUMNI_OPTIONS_SQL, STUDENT_OPTIONS_SQL};
use crate::database::{executor, DbCredentials, RowMap, SqlParam};
use crate::session::{CurrentSession, Flash};
use crate::view;

const LIST_SQL: &str = "SELECT f.Feedback_ID, f.Rating, f.Date, f.Comments, \
            a.Name AS Alumni_Name, s.Name AS Student_Name \
     FROM Feedback f \
     JOIN Alumni a ON f.Alumni_ID = a.Alumni_ID \
     JOIN Student s ON f.Student_ID = s.Student_ID \
     ORDER BY f.Date DESC";
const LIST_BY_ALUMNI_SQL: &str = "SELECT f.Feedback_ID, f.Rating, f.Date, f.Comments, \
            a.Name AS Alumni_Name, s.Name AS Student_Name \
     FROM Feedback f \
     JOIN Alumni a ON f.Alumni_ID = a.Alumni_ID \
     JOIN Student s ON f.Student_ID = s.Student_ID \
     WHERE f.Alumni_ID = ? \
     ORDER BY f.Date DESC";
const GET_SQL: &str = "SELECT * FROM Feedback WHERE Feedback_ID = ?";
const INSERT_SQL: &str = "INSERT INTO Feedback (Feedback_ID, Alumni_ID, Student_ID, Rating, Date, Comments) \
     VALUES (?, ?, ?, ?, ?, ?)";
const UPDATE_SQL: &str = "UPDATE Feedback SET Alumni_ID = ?, Student_ID = ?, Rating = ?, Date = ?, Comments = ? \
     WHERE Feedback_ID = ?";
const DELETE_SQL: &str = "DELETE FROM Feedback WHERE Feedback_ID = ?";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub alumni_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackForm {
    pub feedback_id: String,
    pub alumni_id: String,
    pub student_id: String,
    pub rating: String,
    pub feedback_date: String,
    #[serde(default)]
    pub comments: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackUpdate {
    pub alumni_id: String,
    pub student_id: String,
    pub rating: String,
    pub feedback_date: String,
    #[serde(default)]
    pub comments: String,
}

/// GET /feedback - optionally filtered to one alumni via ?alumni_id=.
pub async fn list(
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<ListQuery>,
) -> Html<String> {
    let mut flashes = take_flashes(&session).await;
    let selected = query.alumni_id.unwrap_or_default();

    let result = if selected.is_empty() {
        executor::fetch_all(&session.credentials, LIST_SQL, &[]).await
    } else {
        executor::fetch_all(
            &session.credentials,
            LIST_BY_ALUMNI_SQL,
            &[SqlParam::from(selected.clone())],
        )
        .await
    };
    let rows = match result {
        Ok(rows) => rows,
        Err(e) => {
            flashes.push(Flash::error(format!("Error loading feedback: {}", e)));
            Vec::new()
        }
    };

    let alumni = id_name_options(&session.credentials, ALUMNI_OPTIONS_SQL).await;
    let filter = format!(
        "<form method=\"get\" action=\"/feedback\">\n{}<button type=\"submit\">Filter</button>\n</form>\n",
        view::select_input("Alumni", "alumni_id", &alumni, &selected)
    );

    let table = view::rows_table_with_actions(&rows, &|row: &RowMap| {
        let id = row_text(row, "Feedback_ID");
        format!(
            "{} {}",
            view::link(&format!("/feedback/edit/{}", id), "Edit"),
            view::inline_post_form(&format!("/feedback/delete/{}", id), "Delete")
        )
    });
    let body = format!(
        "{}\n{}\n<p>{}</p>\n",
        filter,
        table,
        view::link("/feedback/add", "Add feedback")
    );
    view::page("Feedback", &flashes, &body)
}

/// GET /feedback/add
pub async fn add_form(Extension(session): Extension<CurrentSession>) -> Html<String> {
    let flashes = take_flashes(&session).await;
    let body = form_body(&session.credentials, "/feedback/add", &FormValues::empty(), false).await;
    view::page("Add Feedback", &flashes, &body)
}

/// POST /feedback/add
///
/// Rating bounds are trigger-enforced; an out-of-range value comes back as a
/// constraint rejection with the trigger's message.
pub async fn add_submit(
    Extension(session): Extension<CurrentSession>,
    Form(form): Form<FeedbackForm>,
) -> Response {
    let params = [
        SqlParam::from(form.feedback_id.clone()),
        SqlParam::from(form.alumni_id.clone()),
        SqlParam::from(form.student_id.clone()),
        SqlParam::from(form.rating.clone()),
        SqlParam::from(form.feedback_date.clone()),
        SqlParam::from(form.comments.clone()),
    ];

    match executor::execute(&session.credentials, INSERT_SQL, &params).await {
        Ok(_) => {
            flash(&session, Flash::success("Feedback added successfully!")).await;
            Redirect::to("/feedback").into_response()
        }
        Err(e) => {
            let flashes = [Flash::error(format!("Error adding feedback: {}", e))];
            let body = form_body(
                &session.credentials,
                "/feedback/add",
                &FormValues::from_form(&form),
                false,
            )
            .await;
            view::page("Add Feedback", &flashes, &body).into_response()
        }
    }
}

/// GET /feedback/edit/:id
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
                    &format!("/feedback/edit/{}", id),
                    &FormValues::from_row(row),
                    true,
                )
                .await;
                view::page("Edit Feedback", &flashes, &body).into_response()
            }
            None => {
                flash(&session, Flash::error("Feedback not found!")).await;
                Redirect::to("/feedback").into_response()
            }
        },
        Err(e) => {
            flash(&session, Flash::error(format!("Error loading feedback: {}", e))).await;
            Redirect::to("/feedback").into_response()
        }
    }
}

/// POST /feedback/edit/:id
pub async fn edit_submit(
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
    Form(form): Form<FeedbackUpdate>,
) -> Response {
    let params = [
        SqlParam::from(form.alumni_id.clone()),
        SqlParam::from(form.student_id.clone()),
        SqlParam::from(form.rating.clone()),
        SqlParam::from(form.feedback_date.clone()),
        SqlParam::from(form.comments.clone()),
        SqlParam::from(id.clone()),
    ];

    match executor::execute(&session.credentials, UPDATE_SQL, &params).await {
        Ok(_) => {
            flash(&session, Flash::success("Feedback updated successfully!")).await;
            Redirect::to("/feedback").into_response()
        }
        Err(e) => {
            let flashes = [Flash::error(format!("Error updating feedback: {}", e))];
            let body = form_body(
                &session.credentials,
                &format!("/feedback/edit/{}", id),
                &FormValues::from_update(&id, &form),
                true,
            )
            .await;
            view::page("Edit Feedback", &flashes, &body).into_response()
        }
    }
}

/// POST /feedback/delete/:id
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
                    "Feedback deleted successfully! ({} record(s) removed)",
                    n
                )),
            )
            .await
        }
        Err(e) => flash(&session, Flash::error(format!("Error deleting feedback: {}", e))).await,
    }
    Redirect::to("/feedback")
}

struct FormValues {
    feedback_id: String,
    alumni_id: String,
    student_id: String,
    rating: String,
    feedback_date: String,
    comments: String,
}

impl FormValues {
    fn empty() -> Self {
        Self {
            feedback_id: String::new(),
            alumni_id: String::new(),
            student_id: String::new(),
            rating: String::new(),
            feedback_date: String::new(),
            comments: String::new(),
        }
    }

    fn from_row(row: &RowMap) -> Self {
        Self {
            feedback_id: row_text(row, "Feedback_ID"),
            alumni_id: row_text(row, "Alumni_ID"),
            student_id: row_text(row, "Student_ID"),
            rating: row_text(row, "Rating"),
            feedback_date: row_text(row, "Date"),
            comments: row_text(row, "Comments"),
        }
    }

    fn from_form(form: &FeedbackForm) -> Self {
        Self {
            feedback_id: form.feedback_id.clone(),
            alumni_id: form.alumni_id.clone(),
            student_id: form.student_id.clone(),
            rating: form.rating.clone(),
            feedback_date: form.feedback_date.clone(),
            comments: form.comments.clone(),
        }
    }

    fn from_update(id: &str, form: &FeedbackUpdate) -> Self {
        Self {
            feedback_id: id.to_string(),
            alumni_id: form.alumni_id.clone(),
            student_id: form.student_id.clone(),
            rating: form.rating.clone(),
            feedback_date: form.feedback_date.clone(),
            comments: form.comments.clone(),
        }
    }
}

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
        fields.push_str(&view::text_input("Feedback ID", "feedback_id", &values.feedback_id));
    }
    fields.push_str(&view::select_input("Alumni", "alumni_id", &alumni, &values.alumni_id));
    fields.push_str(&view::select_input(
        "Student",
        "student_id",
        &students,
        &values.student_id,
    ));
    fields.push_str(&view::text_input("Rating (1-5)", "rating", &values.rating));
    fields.push_str(&view::text_input("Date", "feedback_date", &values.feedback_date));
    fields.push_str(&view::text_input("Comments", "comments", &values.comments));
    view::form(
        action,
        if editing { "Update feedback" } else { "Add feedback" },
        &fields,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_values_map_feedback_columns() {
        let mut row = RowMap::new();
        row.insert("Feedback_ID".into(), json!("FDB100"));
        row.insert("Alumni_ID".into(), json!("ALUM001"));
        row.insert("Student_ID".into(), json!("STU001"));
        row.insert("Rating".into(), json!(5));
        row.insert("Date".into(), json!("2025-11-05"));
        row.insert("Comments".into(), serde_json::Value::Null);

        let values = FormValues::from_row(&row);
        assert_eq!(values.rating, "5");
        assert_eq!(values.comments, "");
    }
}
