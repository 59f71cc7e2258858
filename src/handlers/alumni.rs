use axum::extract::Path;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use serde::Deserialize;

use super::{flash, row_text, take_flashes, text_or_null};
use crate::database::{executor, RowMap, SqlParam};
use crate::session::{CurrentSession, Flash};
use crate::view;

const LIST_SQL: &str = "SELECT Alumni_ID, Name, Email, Current_Designation, Company, Years_of_Experience \
     FROM Alumni ORDER BY Name";
const GET_SQL: &str = "SELECT * FROM Alumni WHERE Alumni_ID = ?";
const INSERT_SQL: &str = "INSERT INTO Alumni (Alumni_ID, Name, Phone_Number, Email, Graduation_Year, \
     Current_Designation, Company, Location, Years_of_Experience) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";
const UPDATE_SQL: &str = "UPDATE Alumni SET Name = ?, Phone_Number = ?, Email = ?, Graduation_Year = ?, \
     Current_Designation = ?, Company = ?, Location = ?, Years_of_Experience = ? \
     WHERE Alumni_ID = ?";
const DELETE_SQL: &str = "DELETE FROM Alumni WHERE Alumni_ID = ?";

#[derive(Debug, Deserialize)]
pub struct AlumniForm {
    pub alumni_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub graduation_year: String,
    pub designation: String,
    pub company: String,
    pub location: String,
    #[serde(default)]
    pub experience: String,
}

#[derive(Debug, Deserialize)]
pub struct AlumniUpdate {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub graduation_year: String,
    pub designation: String,
    pub company: String,
    pub location: String,
    #[serde(default)]
    pub experience: String,
}

/// GET /alumni
pub async fn list(Extension(session): Extension<CurrentSession>) -> Html<String> {
    let mut flashes = take_flashes(&session).await;
    let rows = match executor::fetch_all(&session.credentials, LIST_SQL, &[]).await {
        Ok(rows) => rows,
        Err(e) => {
            flashes.push(Flash::error(format!("Error loading alumni: {}", e)));
            Vec::new()
        }
    };

    let table = view::rows_table_with_actions(&rows, &|row: &RowMap| {
        let id = row_text(row, "Alumni_ID");
        format!(
            "{} {}",
            view::link(&format!("/alumni/edit/{}", id), "Edit"),
            view::inline_post_form(&format!("/alumni/delete/{}", id), "Delete")
        )
    });
    let body = format!("{}\n<p>{}</p>\n", table, view::link("/alumni/add", "Add alumni"));
    view::page("Alumni", &flashes, &body)
}

/// GET /alumni/add
pub async fn add_form(Extension(session): Extension<CurrentSession>) -> Html<String> {
    let flashes = take_flashes(&session).await;
    view::page(
        "Add Alumni",
        &flashes,
        &form_body("/alumni/add", &FormValues::empty(), false),
    )
}

/// POST /alumni/add
pub async fn add_submit(
    Extension(session): Extension<CurrentSession>,
    Form(form): Form<AlumniForm>,
) -> Response {
    let params = [
        SqlParam::from(form.alumni_id.clone()),
        SqlParam::from(form.name.clone()),
        SqlParam::from(form.phone.clone()),
        SqlParam::from(form.email.clone()),
        SqlParam::from(form.graduation_year.clone()),
        SqlParam::from(form.designation.clone()),
        SqlParam::from(form.company.clone()),
        SqlParam::from(form.location.clone()),
        text_or_null(&form.experience),
    ];

    match executor::execute(&session.credentials, INSERT_SQL, &params).await {
        Ok(_) => {
            flash(&session, Flash::success("Alumni added successfully!")).await;
            Redirect::to("/alumni").into_response()
        }
        Err(e) => {
            let flashes = [Flash::error(format!("Error adding alumni: {}", e))];
            view::page(
                "Add Alumni",
                &flashes,
                &form_body("/alumni/add", &FormValues::from_form(&form), false),
            )
            .into_response()
        }
    }
}

/// GET /alumni/edit/:id
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
                    "Edit Alumni",
                    &flashes,
                    &form_body(
                        &format!("/alumni/edit/{}", id),
                        &FormValues::from_row(row),
                        true,
                    ),
                )
                .into_response()
            }
            None => {
                flash(&session, Flash::error("Alumni not found!")).await;
                Redirect::to("/alumni").into_response()
            }
        },
        Err(e) => {
            flash(&session, Flash::error(format!("Error loading alumni: {}", e))).await;
            Redirect::to("/alumni").into_response()
        }
    }
}

/// POST /alumni/edit/:id
pub async fn edit_submit(
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
    Form(form): Form<AlumniUpdate>,
) -> Response {
    let params = [
        SqlParam::from(form.name.clone()),
        SqlParam::from(form.phone.clone()),
        SqlParam::from(form.email.clone()),
        SqlParam::from(form.graduation_year.clone()),
        SqlParam::from(form.designation.clone()),
        SqlParam::from(form.company.clone()),
        SqlParam::from(form.location.clone()),
        text_or_null(&form.experience),
        SqlParam::from(id.clone()),
    ];

    match executor::execute(&session.credentials, UPDATE_SQL, &params).await {
        Ok(_) => {
            flash(&session, Flash::success("Alumni updated successfully!")).await;
            Redirect::to("/alumni").into_response()
        }
        Err(e) => {
            let flashes = [Flash::error(format!("Error updating alumni: {}", e))];
            view::page(
                "Edit Alumni",
                &flashes,
                &form_body(
                    &format!("/alumni/edit/{}", id),
                    &FormValues::from_update(&id, &form),
                    true,
                ),
            )
            .into_response()
        }
    }
}

/// POST /alumni/delete/:id
pub async fn delete(
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> Redirect {
    match executor::execute(&session.credentials, DELETE_SQL, &[SqlParam::from(id)]).await {
        Ok(0) => flash(&session, Flash::error("Insufficient privileges.")).await,
        Ok(n) => {
            flash(
                &session,
                Flash::success(format!("Alumni deleted successfully! ({} record(s) removed)", n)),
            )
            .await
        }
        Err(e) => flash(&session, Flash::error(format!("Error deleting alumni: {}", e))).await,
    }
    Redirect::to("/alumni")
}

struct FormValues {
    alumni_id: String,
    name: String,
    phone: String,
    email: String,
    graduation_year: String,
    designation: String,
    company: String,
    location: String,
    experience: String,
}

impl FormValues {
    fn empty() -> Self {
        Self {
            alumni_id: String::new(),
            name: String::new(),
            phone: String::new(),
            email: String::new(),
            graduation_year: String::new(),
            designation: String::new(),
            company: String::new(),
            location: String::new(),
            experience: String::new(),
        }
    }

    fn from_row(row: &RowMap) -> Self {
        Self {
            alumni_id: row_text(row, "Alumni_ID"),
            name: row_text(row, "Name"),
            phone: row_text(row, "Phone_Number"),
            email: row_text(row, "Email"),
            graduation_year: row_text(row, "Graduation_Year"),
            designation: row_text(row, "Current_Designation"),
            company: row_text(row, "Company"),
            location: row_text(row, "Location"),
            experience: row_text(row, "Years_of_Experience"),
        }
    }

    fn from_form(form: &AlumniForm) -> Self {
        Self {
            alumni_id: form.alumni_id.clone(),
            name: form.name.clone(),
            phone: form.phone.clone(),
            email: form.email.clone(),
            graduation_year: form.graduation_year.clone(),
            designation: form.designation.clone(),
            company: form.company.clone(),
            location: form.location.clone(),
            experience: form.experience.clone(),
        }
    }

    fn from_update(id: &str, form: &AlumniUpdate) -> Self {
        Self {
            alumni_id: id.to_string(),
            name: form.name.clone(),
            phone: form.phone.clone(),
            email: form.email.clone(),
            graduation_year: form.graduation_year.clone(),
            designation: form.designation.clone(),
            company: form.company.clone(),
            location: form.location.clone(),
            experience: form.experience.clone(),
        }
    }
}

fn form_body(action: &str, values: &FormValues, editing: bool) -> String {
    let mut fields = String::new();
    if !editing {
        fields.push_str(&view::text_input("Alumni ID", "alumni_id", &values.alumni_id));
    }
    fields.push_str(&view::text_input("Name", "name", &values.name));
    fields.push_str(&view::text_input("Phone", "phone", &values.phone));
    fields.push_str(&view::text_input("Email", "email", &values.email));
    fields.push_str(&view::text_input(
        "Graduation year",
        "graduation_year",
        &values.graduation_year,
    ));
    fields.push_str(&view::text_input("Designation", "designation", &values.designation));
    fields.push_str(&view::text_input("Company", "company", &values.company));
    fields.push_str(&view::text_input("Location", "location", &values.location));
    fields.push_str(&view::text_input(
        "Years of experience",
        "experience",
        &values.experience,
    ));
    view::form(
        action,
        if editing { "Update alumni" } else { "Add alumni" },
        &fields,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_values_map_database_columns() {
        let mut row = RowMap::new();
        row.insert("Alumni_ID".into(), json!("ALUM001"));
        row.insert("Name".into(), json!("Jane Roe"));
        row.insert("Phone_Number".into(), json!("9876543210"));
        row.insert("Email".into(), json!("jane@example.com"));
        row.insert("Graduation_Year".into(), json!(2015));
        row.insert("Current_Designation".into(), json!("Engineer"));
        row.insert("Company".into(), json!("Acme"));
        row.insert("Location".into(), json!("Pune"));
        row.insert("Years_of_Experience".into(), serde_json::Value::Null);

        let values = FormValues::from_row(&row);
        assert_eq!(values.alumni_id, "ALUM001");
        assert_eq!(values.graduation_year, "2015");
        assert_eq!(values.experience, "");
    }

    #[test]
    fn edit_form_omits_the_primary_key_field() {
        let body = form_body("/alumni/edit/ALUM001", &FormValues::empty(), true);
        assert!(!body.contains("name=\"alumni_id\""));
        assert!(body.contains("name=\"name\""));

        let body = form_body("/alumni/add", &FormValues::empty(), false);
        assert!(body.contains("name=\"alumni_id\""));
    }
}
