pub mod achievements;
pub mod alumni;
pub mod auth;
pub mod dashboard;
pub mod diagnostics;
pub mod feedback;
pub mod sessions;
pub mod students;

use serde_json::Value;
use tracing::error;

use crate::database::{executor, DbCredentials, QueryError, RowMap, SqlParam};
use crate::session::{CurrentSession, Flash, SessionStore};
use crate::view;

pub(crate) const ALUMNI_OPTIONS_SQL: &str =
    "SELECT Alumni_ID, Name FROM Alumni ORDER BY Name";
pub(crate) const STUDENT_OPTIONS_SQL: &str =
    "SELECT Student_ID, Name FROM Student ORDER BY Name";

pub(crate) async fn flash(session: &CurrentSession, flash: Flash) {
    SessionStore::instance().push_flash(session.id, flash).await;
}

pub(crate) async fn take_flashes(session: &CurrentSession) -> Vec<Flash> {
    SessionStore::instance().take_flashes(session.id).await
}

/// Empty form fields become NULL for nullable columns.
pub(crate) fn text_or_null(value: &str) -> SqlParam {
    if value.trim().is_empty() {
        SqlParam::Null
    } else {
        SqlParam::Text(value.to_string())
    }
}

pub(crate) fn row_text(row: &RowMap, column: &str) -> String {
    row.get(column).map(view::value_text).unwrap_or_default()
}

/// Run a COUNT(*) statement and pull out its single `count` cell. A result
/// set without that cell counts as zero; a failed query is an error, not an
/// empty result.
pub(crate) async fn fetch_count(
    credentials: &DbCredentials,
    statement: &str,
    params: &[SqlParam],
) -> Result<i64, QueryError> {
    let rows = executor::fetch_all(credentials, statement, params).await?;
    Ok(rows
        .first()
        .and_then(|row| row.get("count"))
        .and_then(Value::as_i64)
        .unwrap_or(0))
}

/// Fetch (id, name) pairs for a form dropdown. Failures log and render as an
/// empty dropdown rather than breaking the form page.
pub(crate) async fn id_name_options(
    credentials: &DbCredentials,
    statement: &str,
) -> Vec<(String, String)> {
    match executor::fetch_all(credentials, statement, &[]).await {
        Ok(rows) => rows
            .iter()
            .map(|row| {
                let mut values = row.values();
                let id = values.next().map(view::value_text).unwrap_or_default();
                let name = values.next().map(view::value_text).unwrap_or_default();
                (id, name)
            })
            .collect(),
        Err(e) => {
            error!("error loading dropdown options: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_optional_fields_bind_as_null() {
        assert_eq!(text_or_null(""), SqlParam::Null);
        assert_eq!(text_or_null("   "), SqlParam::Null);
        assert_eq!(text_or_null("12"), SqlParam::Text("12".into()));
    }

    #[test]
    fn row_text_handles_missing_and_null_columns() {
        let mut row = RowMap::new();
        row.insert("Name".into(), json!("Jane"));
        row.insert("Company".into(), Value::Null);
        assert_eq!(row_text(&row, "Name"), "Jane");
        assert_eq!(row_text(&row, "Company"), "");
        assert_eq!(row_text(&row, "Missing"), "");
    }
}
