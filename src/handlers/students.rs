use axum::extract::Path;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use serde::Deserialize;

use super::{flash, row_text, take_flashes};
use crate::database::{executor, RowMap, SqlParam};
use crate::session::{CurrentSession, Flash};
use crate::view;

const LIST_SQL: &str =
    "SELECT Student_ID, Name, Email, Department, Year_of_Study FROM Student ORDER BY Name";
const GET_SQL: &str = "SELECT * FROM Student WHERE Student_ID = ?";
const INSERT_SQL: &str = "INSERT INTO Student (Student_ID, Name, Phone_Number, Email, Department, Year_of_Study) \
     VALUES (?, ?, ?, ?, ?, ?)";
const UPDATE_SQL: &str = "UPDATE Student SET Name = ?, Phone_Number = ?, Email = ?, Department = ?, Year_of_Study = ? \
     WHERE Student_ID = ?";
const DELETE_SQL: &str = "DELETE FROM Student WHERE Student_ID = ?";

#[derive(Debug, Deserialize)]
pub struct StudentForm {
    pub student_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub department: String,
    pub year_of_study: String,
}

#[derive(Debug, Deserialize)]
pub struct StudentUpdate {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub department: String,
    pub year_of_study: String,
}

/// GET /students
pub async fn list(Extension(session): Extension<CurrentSession>) -> Html<String> {
    let mut flashes = take_flashes(&session).await;
    let rows = match executor::fetch_all(&session.credentials, LIST_SQL, &[]).await {
        Ok(rows) => rows,
        Err(e) => {
            flashes.push(Flash::error(format!("Error loading students: {}", e)));
            Vec::new()
        }
    };

    let table = view::rows_table_with_actions(&rows, &|row: &RowMap| {
        let id = row_text(row, "Student_ID");
        format!(
            "{} {}",
            view::link(&format!("/students/edit/{}", id), "Edit"),
            view::inline_post_form(&format!("/students/delete/{}", id), "Delete")
        )
    });
    let body = format!("{}\n<p>{}</p>\n", table, view::link("/students/add", "Add student"));
    view::page("Students", &flashes, &body)
}

/// GET /students/add
pub async fn add_form(Extension(session): Extension<CurrentSession>) -> Html<String> {
    let flashes = take_flashes(&session).await;
    view::page(
        "Add Student",
        &flashes,
        &form_body("/students/add", &FormValues::empty(), false),
    )
}

/// POST /students/add
///
/// Required-field enforcement stays in the database: a missing non-null
/// column comes back as a constraint rejection and is flashed as-is.
pub async fn add_submit(
    Extension(session): Extension<CurrentSession>,
    Form(form): Form<StudentForm>,
) -> Response {
    let params = [
        SqlParam::from(form.student_id.clone()),
        SqlParam::from(form.name.clone()),
        SqlParam::from(form.phone.clone()),
        SqlParam::from(form.email.clone()),
        SqlParam::from(form.department.clone()),
        SqlParam::from(form.year_of_study.clone()),
    ];

    match executor::execute(&session.credentials, INSERT_SQL, &params).await {
        Ok(_) => {
            flash(&session, Flash::success("Student added successfully!")).await;
            Redirect::to("/students").into_response()
        }
        Err(e) => {
            let flashes = [Flash::error(format!("Error adding student: {}", e))];
            view::page(
                "Add Student",
                &flashes,
                &form_body("/students/add", &FormValues::from_form(&form), false),
            )
            .into_response()
        }
    }
}

/// GET /students/edit/:id
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
                view::page(
                    "Edit Student",
                    &flashes,
                    &form_body(
                        &format!("/students/edit/{}", id),
                        &FormValues::from_row(row),
                        true,
                    ),
                )
                .into_response()
            }
            None => {
                flash(&session, Flash::error("Student not found!")).await;
                Redirect::to("/students").into_response()
            }
        },
        Err(e) => {
            flash(&session, Flash::error(format!("Error loading student: {}", e))).await;
            Redirect::to("/students").into_response()
        }
    }
}

/// POST /students/edit/:id
pub async fn edit_submit(
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
    Form(form): Form<StudentUpdate>,
) -> Response {
    let params = [
        SqlParam::from(form.name.clone()),
        SqlParam::from(form.phone.clone()),
        SqlParam::from(form.email.clone()),
        SqlParam::from(form.department.clone()),
        SqlParam::from(form.year_of_study.clone()),
        SqlParam::from(id.clone()),
    ];

    match executor::execute(&session.credentials, UPDATE_SQL, &params).await {
        Ok(_) => {
            flash(&session, Flash::success("Student updated successfully!")).await;
            Redirect::to("/students").into_response()
        }
        Err(e) => {
            let flashes = [Flash::error(format!("Error updating student: {}", e))];
            view::page(
                "Edit Student",
                &flashes,
                &form_body(
                    &format!("/students/edit/{}", id),
                    &FormValues::from_update(&id, &form),
                    true,
                ),
            )
            .into_response()
        }
    }
}

/// POST /students/delete/:id
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
                    "Student deleted successfully! ({} record(s) removed)",
                    n
                )),
            )
            .await
        }
        Err(e) => flash(&session, Flash::error(format!("Error deleting student: {}", e))).await,
    }
    Redirect::to("/students")
}

struct FormValues {
    student_id: String,
    name: String,
    phone: String,
    email: String,
    department: String,
    year_of_study: String,
}

impl FormValues {
    fn empty() -> Self {
        Self {
            student_id: String::new(),
            name: String::new(),
            phone: String::new(),
            email: String::new(),
            department: String::new(),
            year_of_study: String::new(),
        }
    }

    fn from_row(row: &RowMap) -> Self {
        Self {
            student_id: row_text(row, "Student_ID"),
            name: row_text(row, "Name"),
            phone: row_text(row, "Phone_Number"),
            email: row_text(row, "Email"),
            department: row_text(row, "Department"),
            year_of_study: row_text(row, "Year_of_Study"),
        }
    }

    fn from_form(form: &StudentForm) -> Self {
        Self {
            student_id: form.student_id.clone(),
            name: form.name.clone(),
            phone: form.phone.clone(),
            email: form.email.clone(),
            department: form.department.clone(),
            year_of_study: form.year_of_study.clone(),
        }
    }

    fn from_update(id: &str, form: &StudentUpdate) -> Self {
        Self {
            student_id: id.to_string(),
            name: form.name.clone(),
            phone: form.phone.clone(),
            email: form.email.clone(),
            department: form.department.clone(),
            year_of_study: form.year_of_study.clone(),
        }
    }
}

fn form_body(action: &str, values: &FormValues, editing: bool) -> String {
    let mut fields = String::new();
    if !editing {
        fields.push_str(&view::text_input("Student ID", "student_id", &values.student_id));
    }
    fields.push_str(&view::text_input("Name", "name", &values.name));
    fields.push_str(&view::text_input("Phone", "phone", &values.phone));
    fields.push_str(&view::text_input("Email", "email", &values.email));
    fields.push_str(&view::text_input("Department", "department", &values.department));
    fields.push_str(&view::text_input(
        "Year of study",
        "year_of_study",
        &values.year_of_study,
    ));
    view::form(
        action,
        if editing { "Update student" } else { "Add student" },
        &fields,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_values_round_trip_from_row() {
        let mut row = RowMap::new();
        row.insert("Student_ID".into(), json!("S1"));
        row.insert("Name".into(), json!("A"));
        row.insert("Phone_Number".into(), json!("1"));
        row.insert("Email".into(), json!("a@x.com"));
        row.insert("Department".into(), json!("CS"));
        row.insert("Year_of_Study".into(), json!(2));

        let values = FormValues::from_row(&row);
        assert_eq!(values.student_id, "S1");
        assert_eq!(values.year_of_study, "2");
    }
}
