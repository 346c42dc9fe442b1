//! Database query tool — read-only SQL against the session's working copy.
//!
//! Each session gets its own SQLite file, so a misbehaving query can at
//! worst trash state that is already disposable. The connection is still
//! opened read-only and only SELECT/WITH statements are accepted, since
//! mutations belong to the application, not the engine.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Column, ConnectOptions, Row};
use std::path::PathBuf;
use tracing::debug;

use toolrun_core::Tool;
use toolrun_core::error::ToolError;

const MAX_ROWS: usize = 50;

pub struct DbQueryTool {
    db_path: PathBuf,
}

impl DbQueryTool {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

#[async_trait]
impl Tool for DbQueryTool {
    fn name(&self) -> &str {
        "db_query"
    }

    fn description(&self) -> &str {
        "Run a read-only SQL query (SELECT only) against the session database and return the rows."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "A single SELECT statement, e.g. 'SELECT name, price FROM products LIMIT 5'"
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let sql = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let sql = sql.trim().trim_end_matches(';').trim();
        validate_read_only(sql)?;

        debug!(path = %self.db_path.display(), "Running session query");

        let mut conn = SqliteConnectOptions::new()
            .filename(&self.db_path)
            .read_only(true)
            .connect()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "db_query".into(),
                reason: format!("cannot open session database: {e}"),
            })?;

        let rows = sqlx::query(sql)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "db_query".into(),
                reason: e.to_string(),
            })?;

        Ok(render_rows(&rows))
    }
}

fn validate_read_only(sql: &str) -> Result<(), ToolError> {
    if sql.contains(';') {
        return Err(ToolError::InvalidArguments(
            "Only a single statement is allowed".into(),
        ));
    }

    let first_word = sql
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_uppercase();
    match first_word.as_str() {
        "SELECT" | "WITH" => Ok(()),
        _ => Err(ToolError::InvalidArguments(
            "Only SELECT queries are allowed".into(),
        )),
    }
}

fn render_rows(rows: &[SqliteRow]) -> String {
    let Some(first) = rows.first() else {
        return "(no rows)".into();
    };

    let headers: Vec<&str> = first.columns().iter().map(|c| c.name()).collect();
    let mut out = headers.join(" | ");

    for row in rows.iter().take(MAX_ROWS) {
        let cells: Vec<String> = (0..headers.len()).map(|i| render_value(row, i)).collect();
        out.push('\n');
        out.push_str(&cells.join(" | "));
    }

    if rows.len() > MAX_ROWS {
        out.push_str(&format!("\n... ({} more rows)", rows.len() - MAX_ROWS));
    }
    out
}

fn render_value(row: &SqliteRow, idx: usize) -> String {
    // SQLite is dynamically typed; probe from narrowest to widest.
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map_or("NULL".into(), |n| n.to_string());
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map_or("NULL".into(), |n| n.to_string());
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.unwrap_or_else(|| "NULL".into());
    }
    "<binary>".into()
}
