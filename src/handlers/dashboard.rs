use axum::response::Html;
use axum::Extension;
use tracing::error;

use super::{fetch_count, take_flashes};
use crate::database::{executor, DbCredentials};
use crate::session::{CurrentSession, Flash};
use crate::view;

const RECENT_SESSIONS_SQL: &str = "SELECT ms.Session_Date, a.Name AS Alumni_Name, s.Name AS Student_Name \
     FROM MentorshipSession ms \
     JOIN Alumni a ON ms.Alumni_ID = a.Alumni_ID \
     JOIN Student s ON ms.Student_ID = s.Student_ID \
     ORDER BY ms.Session_Date DESC LIMIT 5";

const CONNECTIONS_SQL: &str = "SELECT \
         a.Name AS Alumni_Name, \
         a.Company, \
         a.Current_Designation, \
         s.Name AS Student_Name, \
         s.Department, \
         s.Year_of_Study, \
         COUNT(ms.Session_ID) AS Total_Sessions, \
         MAX(ms.Session_Date) AS Last_Session \
     FROM Alumni a \
     INNER JOIN MentorshipSession ms ON a.Alumni_ID = ms.Alumni_ID \
     INNER JOIN Student s ON ms.Student_ID = s.Student_ID \
     GROUP BY a.Alumni_ID, a.Name, a.Company, a.Current_Designation, \
              s.Student_ID, s.Name, s.Department, s.Year_of_Study \
     ORDER BY Total_Sessions DESC, Last_Session DESC";

/// GET /
pub async fn index(Extension(session): Extension<CurrentSession>) -> Html<String> {
    let flashes = take_flashes(&session).await;
    let body = format!(
        "<p>Signed in as {}.</p>\n\
         <p>Administrative front end for the alumni mentorship database. Use \
         the navigation above to manage records or run the trigger and \
         procedure smoke tests.</p>",
        view::escape(&session.username)
    );
    view::page("Alumni Mentor Portal", &flashes, &body)
}

/// GET /dashboard - table counts plus the five most recent sessions.
pub async fn dashboard(Extension(session): Extension<CurrentSession>) -> Html<String> {
    let mut flashes = take_flashes(&session).await;

    let alumni = table_count(&session.credentials, "Alumni", &mut flashes).await;
    let students = table_count(&session.credentials, "Student", &mut flashes).await;
    let sessions = table_count(&session.credentials, "MentorshipSession", &mut flashes).await;
    let feedback = table_count(&session.credentials, "Feedback", &mut flashes).await;

    let recent = match executor::fetch_all(&session.credentials, RECENT_SESSIONS_SQL, &[]).await {
        Ok(rows) => rows,
        Err(e) => {
            error!("error loading recent sessions: {}", e);
            flashes.push(Flash::error(format!("Error loading dashboard: {}", e)));
            Vec::new()
        }
    };

    let body = format!(
        "<ul>\n\
         <li>Alumni: {}</li>\n\
         <li>Students: {}</li>\n\
         <li>Mentorship sessions: {}</li>\n\
         <li>Feedback entries: {}</li>\n\
         </ul>\n\
         <h2>Recent Sessions</h2>\n{}",
        alumni,
        students,
        sessions,
        feedback,
        view::rows_table(&recent)
    );
    view::page("Dashboard", &flashes, &body)
}

/// GET /connections - grouped alumni-student mentorship summary.
pub async fn connections(Extension(session): Extension<CurrentSession>) -> Html<String> {
    let mut flashes = take_flashes(&session).await;
    let rows = match executor::fetch_all(&session.credentials, CONNECTIONS_SQL, &[]).await {
        Ok(rows) => rows,
        Err(e) => {
            flashes.push(Flash::error(format!("Error loading connections: {}", e)));
            Vec::new()
        }
    };
    view::page("Alumni-Student Connections", &flashes, &view::rows_table(&rows))
}

// A failed count renders as zero alongside an error flash; it is never
// conflated with a genuine zero-row table, which produces no flash.
async fn table_count(
    credentials: &DbCredentials,
    table: &str,
    flashes: &mut Vec<Flash>,
) -> i64 {
    let statement = format!("SELECT COUNT(*) AS count FROM {}", table);
    match fetch_count(credentials, &statement, &[]).await {
        Ok(count) => count,
        Err(e) => {
            error!("error counting {} rows: {}", table, e);
            flashes.push(Flash::error(format!("Error loading dashboard: {}", e)));
            0
        }
    }
}
