use chrono::NaiveDate;
use futures::TryStreamExt;
use serde_json::{Map, Value};
use sqlx::mysql::{MySqlArguments, MySqlColumn, MySqlConnection, MySqlDatabaseError, MySqlRow};
use sqlx::{Column, Connection, Either, Executor, Row, TypeInfo};
use thiserror::Error;
use tracing::{error, warn};

use super::credentials::DbCredentials;

/// One result row as an ordered column name -> value mapping.
pub type RowMap = Map<String, Value>;

/// Classified statement failure.
///
/// Callers branch on the variant, never on message text: the trigger smoke
/// tests treat any `Constraint` as "the database rejected the write", and the
/// handlers treat `Connection` as distinct from an empty result set.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The database rejected the statement: duplicate key, foreign key,
    /// not-null, out-of-range, or a SIGNAL raised by a trigger.
    #[error("rejected by database: {message}")]
    Constraint { message: String },

    #[error("database connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Execution(#[source] sqlx::Error),

    #[error("invalid procedure name: {0}")]
    InvalidProcedureName(String),

    #[error("invalid database configuration: {0}")]
    Configuration(String),
}

/// Positional statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Date(NaiveDate),
    Null,
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Int(value)
    }
}

impl From<NaiveDate> for SqlParam {
    fn from(value: NaiveDate) -> Self {
        SqlParam::Date(value)
    }
}

/// Open a connection with the given credentials and close it again.
///
/// Login uses this to hand the username/password to the database's own
/// authentication; there is no password handling on this side.
pub async fn verify(credentials: &DbCredentials) -> Result<(), QueryError> {
    let conn = open(credentials).await?;
    close(conn).await;
    Ok(())
}

/// Execute a statement and return every result row as an ordered mapping.
pub async fn fetch_all(
    credentials: &DbCredentials,
    statement: &str,
    params: &[SqlParam],
) -> Result<Vec<RowMap>, QueryError> {
    let mut conn = open(credentials).await?;
    let result = fetch_all_inner(&mut conn, statement, params).await;
    close(conn).await;
    result
}

/// Execute a write statement inside a transaction and return the affected-row
/// count. The transaction rolls back if execution fails.
pub async fn execute(
    credentials: &DbCredentials,
    statement: &str,
    params: &[SqlParam],
) -> Result<u64, QueryError> {
    let mut conn = open(credentials).await?;
    let result = execute_inner(&mut conn, statement, params).await;
    close(conn).await;
    result
}

/// Invoke a stored routine and drain every result set it produces into a
/// single row sequence. The name is validated before it is interpolated.
pub async fn call_procedure(
    credentials: &DbCredentials,
    name: &str,
    params: &[SqlParam],
) -> Result<Vec<RowMap>, QueryError> {
    if !is_valid_routine_name(name) {
        return Err(QueryError::InvalidProcedureName(name.to_string()));
    }
    let statement = call_statement(name, params.len());

    let mut conn = open(credentials).await?;
    let result = call_inner(&mut conn, &statement, params).await;
    close(conn).await;
    result
}

async fn open(credentials: &DbCredentials) -> Result<MySqlConnection, QueryError> {
    let url = credentials
        .connection_url()
        .map_err(|e| QueryError::Configuration(e.to_string()))?;
    MySqlConnection::connect(&url).await.map_err(|e| {
        warn!("error connecting to database: {}", e);
        QueryError::Connection(e)
    })
}

async fn close(conn: MySqlConnection) {
    if let Err(e) = conn.close().await {
        warn!("error closing database connection: {}", e);
    }
}

async fn fetch_all_inner(
    conn: &mut MySqlConnection,
    statement: &str,
    params: &[SqlParam],
) -> Result<Vec<RowMap>, QueryError> {
    let rows = bind_params(statement, params)
        .fetch_all(&mut *conn)
        .await
        .map_err(classify)?;
    Ok(rows.iter().map(row_to_map).collect())
}

async fn execute_inner(
    conn: &mut MySqlConnection,
    statement: &str,
    params: &[SqlParam],
) -> Result<u64, QueryError> {
    let mut tx = conn.begin().await.map_err(classify)?;
    let done = bind_params(statement, params)
        .execute(&mut *tx)
        .await
        .map_err(classify)?;
    tx.commit().await.map_err(classify)?;
    Ok(done.rows_affected())
}

async fn call_inner(
    conn: &mut MySqlConnection,
    statement: &str,
    params: &[SqlParam],
) -> Result<Vec<RowMap>, QueryError> {
    let mut rows = Vec::new();
    let mut stream = (&mut *conn).fetch_many(bind_params(statement, params));
    while let Some(step) = stream.try_next().await.map_err(classify)? {
        if let Either::Right(row) = step {
            rows.push(row_to_map(&row));
        }
    }
    Ok(rows)
}

fn bind_params<'q>(
    statement: &'q str,
    params: &'q [SqlParam],
) -> sqlx::query::Query<'q, sqlx::MySql, MySqlArguments> {
    let mut query = sqlx::query(statement);
    for param in params {
        query = match param {
            SqlParam::Text(v) => query.bind(v.as_str()),
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Date(v) => query.bind(*v),
            SqlParam::Null => query.bind(Option::<String>::None),
        };
    }
    query
}

fn call_statement(name: &str, param_count: usize) -> String {
    let placeholders = vec!["?"; param_count].join(", ");
    format!("CALL {}({})", name, placeholders)
}

/// Accepts MySQL identifier characters only. Routine names arrive from the
/// request path, so anything else is rejected before a connection is opened.
fn is_valid_routine_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// MySQL error numbers that mean "the data was rejected", as opposed to the
/// statement or connection being broken. 1644 is ER_SIGNAL_EXCEPTION, the
/// number produced by `SIGNAL SQLSTATE '45000'` in the schema's triggers.
const CONSTRAINT_ERROR_NUMBERS: &[u32] = &[
    1048, // column cannot be null
    1062, // duplicate entry
    1216, 1217, // foreign key (legacy numbers)
    1264, // out of range
    1406, // data too long
    1451, 1452, // foreign key
    1644, // trigger SIGNAL
    3819, // CHECK constraint
];

fn is_constraint_violation(number: u32) -> bool {
    CONSTRAINT_ERROR_NUMBERS.contains(&number)
}

fn classify(err: sqlx::Error) -> QueryError {
    if let sqlx::Error::Database(db) = &err {
        let number = db
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(|e| e.number() as u32);
        if number.is_some_and(is_constraint_violation) {
            warn!("statement rejected by database: {}", db.message());
            return QueryError::Constraint {
                message: db.message().to_string(),
            };
        }
        error!("error executing query: {}", db.message());
        return QueryError::Execution(err);
    }

    match err {
        e @ (sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_)) => {
            error!("error connecting to database: {}", e);
            QueryError::Connection(e)
        }
        e => {
            error!("error executing query: {}", e);
            QueryError::Execution(e)
        }
    }
}

fn row_to_map(row: &MySqlRow) -> RowMap {
    let mut map = RowMap::new();
    for column in row.columns() {
        map.insert(column.name().to_string(), column_value(row, column));
    }
    map
}

/// Decode one column into a JSON value based on its MySQL type. Unknown
/// types fall back to a string decode, then to null.
fn column_value(row: &MySqlRow, column: &MySqlColumn) -> Value {
    let index = column.ordinal();
    match column.type_info().name() {
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row
            .try_get::<Option<u64>, _>(index)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "FLOAT" | "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null),
        "DATETIME" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
            .ok()
            .flatten()
            .map(|d| Value::String(d.to_rfc3339()))
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_and_constraint_numbers_classify_as_constraint() {
        assert!(is_constraint_violation(1644)); // trigger SIGNAL
        assert!(is_constraint_violation(1062)); // duplicate email via unique key
        assert!(is_constraint_violation(1452)); // dangling Alumni_ID reference
        assert!(!is_constraint_violation(1064)); // syntax error
        assert!(!is_constraint_violation(1045)); // access denied
    }

    #[test]
    fn routine_names_are_identifier_only() {
        assert!(is_valid_routine_name("RegisterStudent"));
        assert!(is_valid_routine_name("_internal_proc2"));
        assert!(!is_valid_routine_name(""));
        assert!(!is_valid_routine_name("2fast"));
        assert!(!is_valid_routine_name("Drop Table"));
        assert!(!is_valid_routine_name("x; DROP TABLE Student"));
    }

    #[test]
    fn call_statement_has_one_placeholder_per_param() {
        assert_eq!(call_statement("RegisterStudent", 0), "CALL RegisterStudent()");
        assert_eq!(
            call_statement("ScheduleSession", 3),
            "CALL ScheduleSession(?, ?, ?)"
        );
    }

    #[test]
    fn params_convert_from_native_types() {
        assert_eq!(SqlParam::from("SES100"), SqlParam::Text("SES100".into()));
        assert_eq!(SqlParam::from(60i64), SqlParam::Int(60));
        let date = NaiveDate::from_ymd_opt(2025, 11, 5).unwrap();
        assert_eq!(SqlParam::from(date), SqlParam::Date(date));
    }
}
