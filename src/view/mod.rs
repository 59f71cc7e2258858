//! Minimal server-rendered HTML. The pages carry no design content; they
//! exist so every operation is reachable from a browser.

use axum::response::Html;
use serde_json::Value;

use crate::database::RowMap;
use crate::session::{Flash, FlashLevel};

/// Escape a value for interpolation into HTML text or attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Page shell: title, nav, flash banner, body.
pub fn page(title: &str, flashes: &[Flash], body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n<h1>{title}</h1>\n{nav}\n{flashes}\n{body}\n</body></html>\n",
        title = escape(title),
        nav = nav(),
        flashes = flash_banner(flashes),
        body = body,
    ))
}

fn nav() -> &'static str {
    "<nav>\
     <a href=\"/\">Home</a> | <a href=\"/dashboard\">Dashboard</a> | \
     <a href=\"/alumni\">Alumni</a> | <a href=\"/students\">Students</a> | \
     <a href=\"/sessions\">Sessions</a> | <a href=\"/feedback\">Feedback</a> | \
     <a href=\"/alumni/achievements\">Achievements</a> | \
     <a href=\"/connections\">Connections</a> | \
     <a href=\"/test/triggers\">Trigger Tests</a> | \
     <a href=\"/test/procedures\">Procedure Tests</a> | \
     <a href=\"/logout\">Logout</a>\
     </nav>"
}

fn flash_banner(flashes: &[Flash]) -> String {
    let mut out = String::new();
    for flash in flashes {
        let class = match flash.level {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
            FlashLevel::Warning => "warning",
        };
        out.push_str(&format!(
            "<p class=\"flash {}\">{}</p>\n",
            class,
            escape(&flash.message)
        ));
    }
    out
}

/// Render a JSON cell value as plain text.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Table over row mappings; headers come from the first row's column order.
pub fn rows_table(rows: &[RowMap]) -> String {
    render_table(rows, None)
}

/// Same, with a trailing per-row actions cell (edit links, delete buttons).
pub fn rows_table_with_actions(rows: &[RowMap], actions: &dyn Fn(&RowMap) -> String) -> String {
    render_table(rows, Some(actions))
}

fn render_table(rows: &[RowMap], actions: Option<&dyn Fn(&RowMap) -> String>) -> String {
    let Some(first) = rows.first() else {
        return "<p>No records found.</p>".to_string();
    };

    let mut out = String::from("<table border=\"1\">\n<tr>");
    for name in first.keys() {
        out.push_str(&format!("<th>{}</th>", escape(name)));
    }
    if actions.is_some() {
        out.push_str("<th>Actions</th>");
    }
    out.push_str("</tr>\n");

    for row in rows {
        out.push_str("<tr>");
        for value in row.values() {
            out.push_str(&format!("<td>{}</td>", escape(&value_text(value))));
        }
        if let Some(actions) = actions {
            out.push_str(&format!("<td>{}</td>", actions(row)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
    out
}

pub fn text_input(label: &str, name: &str, value: &str) -> String {
    format!(
        "<label>{label} <input type=\"text\" name=\"{name}\" value=\"{value}\"></label><br>\n",
        label = escape(label),
        name = escape(name),
        value = escape(value),
    )
}

pub fn select_input(
    label: &str,
    name: &str,
    options: &[(String, String)],
    selected: &str,
) -> String {
    let mut out = format!(
        "<label>{} <select name=\"{}\">\n<option value=\"\"></option>\n",
        escape(label),
        escape(name)
    );
    for (value, text) in options {
        let marker = if value == selected { " selected" } else { "" };
        out.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            escape(value),
            marker,
            escape(text)
        ));
    }
    out.push_str("</select></label><br>\n");
    out
}

pub fn form(action: &str, submit: &str, fields: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{}\">\n{}<button type=\"submit\">{}</button>\n</form>\n",
        escape(action),
        fields,
        escape(submit)
    )
}

/// Single-button POST form, used for delete buttons and the trigger tests.
pub fn inline_post_form(action: &str, label: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{}\" style=\"display:inline\">\
         <button type=\"submit\">{}</button></form>",
        escape(action),
        escape(label)
    )
}

pub fn link(href: &str, label: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape(href), escape(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escapes_html_metacharacters() {
        assert_eq!(
            escape("<b>\"R&D\" 'x'</b>"),
            "&lt;b&gt;&quot;R&amp;D&quot; &#39;x&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn empty_row_set_renders_placeholder() {
        assert_eq!(rows_table(&[]), "<p>No records found.</p>");
    }

    #[test]
    fn table_preserves_column_order_and_escapes_cells() {
        let mut row = RowMap::new();
        row.insert("Alumni_ID".into(), json!("ALUM001"));
        row.insert("Name".into(), json!("<script>"));
        row.insert("Years_of_Experience".into(), Value::Null);

        let html = rows_table(&[row]);
        let id_pos = html.find("Alumni_ID").unwrap();
        let name_pos = html.find("Name").unwrap();
        assert!(id_pos < name_pos);
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<td></td>")); // null renders empty
        assert!(!html.contains("Actions"));
    }

    #[test]
    fn actions_column_appends_per_row() {
        let mut row = RowMap::new();
        row.insert("Student_ID".into(), json!("S1"));
        let html = rows_table_with_actions(&[row], &|row| {
            link(
                &format!("/students/edit/{}", value_text(&row["Student_ID"])),
                "Edit",
            )
        });
        assert!(html.contains("<th>Actions</th>"));
        assert!(html.contains("/students/edit/S1"));
    }

    #[test]
    fn select_marks_selected_option() {
        let options = vec![
            ("ALUM001".to_string(), "Jane".to_string()),
            ("ALUM002".to_string(), "Ravi".to_string()),
        ];
        let html = select_input("Alumni", "alumni_id", &options, "ALUM002");
        assert!(html.contains("<option value=\"ALUM002\" selected>Ravi</option>"));
        assert!(html.contains("<option value=\"ALUM001\">Jane</option>"));
    }
}
