use axum::extract::Path;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use serde::Deserialize;

use super::{flash, id_name_options, row_text, take_flashes, text_or_null, ALUMNI_OPTIONS_SQL};
use crate::database::{executor, DbCredentials, RowMap, SqlParam};
use crate::session::{CurrentSession, Flash};
use crate::view;

const LIST_SQL: &str = "SELECT Achievement_ID, Alumni_ID, Awarding_Body, Title, Description, Year \
     FROM Achievement ORDER BY Year DESC";
const GET_SQL: &str = "SELECT * FROM Achievement WHERE Achievement_ID = ?";
const INSERT_SQL: &str = "INSERT INTO Achievement (Achievement_ID, Alumni_ID, Awarding_Body, Title, Description, Year) \
     VALUES (?, ?, ?, ?, ?, ?)";
const UPDATE_SQL: &str = "UPDATE Achievement SET Alumni_ID = ?, Awarding_Body = ?, Title = ?, Description = ?, \
     Year = ? WHERE Achievement_ID = ?";
const DELETE_SQL: &str = "DELETE FROM Achievement WHERE Achievement_ID = ?";

#[derive(Debug, Deserialize)]
pub struct AchievementForm {
    pub achievement_id: String,
    pub alumni_id: String,
    pub awarding_body: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub year: String,
}

#[derive(Debug, Deserialize)]
pub struct AchievementUpdate {
    pub alumni_id: String,
    pub awarding_body: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub year: String,
}

/// GET /alumni/achievements - list plus the inline add form.
pub async fn list(Extension(session): Extension<CurrentSession>) -> Html<String> {
    let flashes = take_flashes(&session).await;
    render_list(&session, flashes).await
}

/// POST /alumni/achievements - add; on failure the list page reloads with
/// the error flashed.
pub async fn add(
    Extension(session): Extension<CurrentSession>,
    Form(form): Form<AchievementForm>,
) -> Response {
    let params = [
        SqlParam::from(form.achievement_id),
        SqlParam::from(form.alumni_id),
        SqlParam::from(form.awarding_body),
        SqlParam::from(form.title),
        text_or_null(&form.description),
        SqlParam::from(form.year),
    ];

    match executor::execute(&session.credentials, INSERT_SQL, &params).await {
        Ok(_) => {
            flash(&session, Flash::success("Achievement added successfully!")).await;
            Redirect::to("/alumni/achievements").into_response()
        }
        Err(e) => {
            let mut flashes = take_flashes(&session).await;
            flashes.push(Flash::error(format!("Error adding achievement: {}", e)));
            render_list(&session, flashes).await.into_response()
        }
    }
}

/// GET /alumni/achievements/edit/:id
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
                    &format!("/alumni/achievements/edit/{}", id),
                    &FormValues::from_row(row),
                    true,
                )
                .await;
                view::page("Edit Achievement", &flashes, &body).into_response()
            }
            None => {
                flash(&session, Flash::error("Achievement not found!")).await;
                Redirect::to("/alumni/achievements").into_response()
            }
        },
        Err(e) => {
            flash(
                &session,
                Flash::error(format!("Error loading achievement: {}", e)),
            )
            .await;
            Redirect::to("/alumni/achievements").into_response()
        }
    }
}

/// POST /alumni/achievements/edit/:id
pub async fn edit_submit(
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
    Form(form): Form<AchievementUpdate>,
) -> Response {
    let params = [
        SqlParam::from(form.alumni_id.clone()),
        SqlParam::from(form.awarding_body.clone()),
        SqlParam::from(form.title.clone()),
        text_or_null(&form.description),
        SqlParam::from(form.year.clone()),
        SqlParam::from(id.clone()),
    ];

    match executor::execute(&session.credentials, UPDATE_SQL, &params).await {
        Ok(_) => {
            flash(&session, Flash::success("Achievement updated successfully!")).await;
            Redirect::to("/alumni/achievements").into_response()
        }
        Err(e) => {
            let flashes = [Flash::error(format!("Error updating achievement: {}", e))];
            let body = form_body(
                &session.credentials,
                &format!("/alumni/achievements/edit/{}", id),
                &FormValues::from_update(&id, &form),
                true,
            )
            .await;
            view::page("Edit Achievement", &flashes, &body).into_response()
        }
    }
}

/// POST /alumni/achievements/delete/:id
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
                    "Achievement deleted successfully! ({} record(s) removed)",
                    n
                )),
            )
            .await
        }
        Err(e) => {
            flash(
                &session,
                Flash::error(format!("Error deleting achievement: {}", e)),
            )
            .await
        }
    }
    Redirect::to("/alumni/achievements")
}

async fn render_list(session: &CurrentSession, mut flashes: Vec<Flash>) -> Html<String> {
    let rows = match executor::fetch_all(&session.credentials, LIST_SQL, &[]).await {
        Ok(rows) => rows,
        Err(e) => {
            flashes.push(Flash::error(format!("Error loading achievements: {}", e)));
            Vec::new()
        }
    };

    let table = view::rows_table_with_actions(&rows, &|row: &RowMap| {
        let id = row_text(row, "Achievement_ID");
        format!(
            "{} {}",
            view::link(&format!("/alumni/achievements/edit/{}", id), "Edit"),
            view::inline_post_form(&format!("/alumni/achievements/delete/{}", id), "Delete")
        )
    });
    let add_form = form_body(
        &session.credentials,
        "/alumni/achievements",
        &FormValues::empty(),
        false,
    )
    .await;
    let body = format!("{}\n<h2>Add Achievement</h2>\n{}", table, add_form);
    view::page("Alumni Achievements", &flashes, &body)
}

struct FormValues {
    achievement_id: String,
    alumni_id: String,
    awarding_body: String,
    title: String,
    description: String,
    year: String,
}

impl FormValues {
    fn empty() -> Self {
        Self {
            achievement_id: String::new(),
            alumni_id: String::new(),
            awarding_body: String::new(),
            title: String::new(),
            description: String::new(),
            year: String::new(),
        }
    }

    fn from_row(row: &RowMap) -> Self {
        Self {
            achievement_id: row_text(row, "Achievement_ID"),
            alumni_id: row_text(row, "Alumni_ID"),
            awarding_body: row_text(row, "Awarding_Body"),
            title: row_text(row, "Title"),
            description: row_text(row, "Description"),
            year: row_text(row, "Year"),
        }
    }

    fn from_update(id: &str, form: &AchievementUpdate) -> Self {
        Self {
            achievement_id: id.to_string(),
            alumni_id: form.alumni_id.clone(),
            awarding_body: form.awarding_body.clone(),
            title: form.title.clone(),
            description: form.description.clone(),
            year: form.year.clone(),
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

    let mut fields = String::new();
    if !editing {
        fields.push_str(&view::text_input(
            "Achievement ID",
            "achievement_id",
            &values.achievement_id,
        ));
    }
    fields.push_str(&view::select_input("Alumni", "alumni_id", &alumni, &values.alumni_id));
    fields.push_str(&view::text_input(
        "Awarding body",
        "awarding_body",
        &values.awarding_body,
    ));
    fields.push_str(&view::text_input("Title", "title", &values.title));
    fields.push_str(&view::text_input("Description", "description", &values.description));
    fields.push_str(&view::text_input("Year", "year", &values.year));
    view::form(
        action,
        if editing { "Update achievement" } else { "Add achievement" },
        &fields,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_values_map_achievement_columns() {
        let mut row = RowMap::new();
        row.insert("Achievement_ID".into(), json!("ACH001"));
        row.insert("Alumni_ID".into(), json!("ALUM001"));
        row.insert("Awarding_Body".into(), json!("IEEE"));
        row.insert("Title".into(), json!("Best Paper"));
        row.insert("Description".into(), serde_json::Value::Null);
        row.insert("Year".into(), json!(2024));

        let values = FormValues::from_row(&row);
        assert_eq!(values.awarding_body, "IEEE");
        assert_eq!(values.description, "");
        assert_eq!(values.year, "2024");
    }
}
