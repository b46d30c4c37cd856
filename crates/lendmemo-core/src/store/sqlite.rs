//! SQLite-backed memo store.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::MemoStore;
use crate::error::{LendError, LendResult};
use crate::types::{ChangeSet, HistoryAction, Memo, MemoHistory, MemoPatch, MemoStatus};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite memo store.
///
/// Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
/// so that lexical order equals chronological order.
pub struct SqliteMemoStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteMemoStore {
    /// Open or create a store at the given path.
    ///
    /// The special path `:memory:` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> LendResult<Self> {
        let path = path.as_ref().to_path_buf();
        if path.to_str() == Some(":memory:") {
            return Self::in_memory();
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        debug!("Opening memo database at {}", path.display());
        let conn = Connection::open(&path).map_err(|e| LendError::Database {
            message: format!("Failed to open {}: {}", path.display(), e),
            code: crate::error::ErrorCode::DbConnectionFailed,
            source: Some(Box::new(e)),
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            path,
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("Memo database ready at {}", store.path.display());
        Ok(store)
    }

    /// Create an in-memory store (for testing and throwaway servers).
    pub fn in_memory() -> LendResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> LendResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LendError::database("memo database connection lock poisoned"))
    }

    fn init_schema(&self) -> LendResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS memos (
                id               TEXT PRIMARY KEY,
                lent_by_name     TEXT NOT NULL,
                borrowed_by_name TEXT NOT NULL,
                amount_or_item   TEXT NOT NULL,
                loan_date        TEXT NOT NULL,
                due_date         TEXT,
                memo             TEXT,
                status           TEXT NOT NULL,
                version          INTEGER NOT NULL DEFAULT 1,
                created_at       TEXT NOT NULL,
                updated_at       TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS memo_histories (
                id          TEXT PRIMARY KEY,
                memo_id     TEXT NOT NULL REFERENCES memos(id),
                editor_name TEXT NOT NULL,
                action      TEXT NOT NULL,
                changes     TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_memo_histories_memo_time
                ON memo_histories(memo_id, created_at);
            "#,
        )?;
        Ok(())
    }

    fn row_to_memo(row: &Row<'_>) -> LendResult<Memo> {
        let loan_date: String = row.get(4)?;
        let due_date: Option<String> = row.get(5)?;
        let status: String = row.get(7)?;
        let created_at: String = row.get(9)?;
        let updated_at: String = row.get(10)?;

        Ok(Memo {
            id: row.get(0)?,
            lent_by_name: row.get(1)?,
            borrowed_by_name: row.get(2)?,
            amount_or_item: row.get(3)?,
            loan_date: parse_date(&loan_date)?,
            due_date: due_date.as_deref().map(parse_date).transpose()?,
            memo: row.get(6)?,
            status: status
                .parse::<MemoStatus>()
                .map_err(|_| LendError::corrupt_row(format!("unknown memo status '{}'", status)))?,
            version: row.get(8)?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    fn row_to_history(row: &Row<'_>) -> LendResult<MemoHistory> {
        let action: String = row.get(3)?;
        let changes: Option<String> = row.get(4)?;
        let created_at: String = row.get(5)?;

        Ok(MemoHistory {
            id: row.get(0)?,
            memo_id: row.get(1)?,
            editor_name: row.get(2)?,
            action: action.parse::<HistoryAction>().map_err(|_| {
                LendError::corrupt_row(format!("unknown history action '{}'", action))
            })?,
            changes: changes
                .as_deref()
                .map(|raw| serde_json::from_str::<ChangeSet>(raw))
                .transpose()?,
            created_at: parse_timestamp(&created_at)?,
        })
    }
}

#[async_trait]
impl MemoStore for SqliteMemoStore {
    async fn insert_memo(&self, memo: &Memo) -> LendResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO memos (
                id, lent_by_name, borrowed_by_name, amount_or_item, loan_date,
                due_date, memo, status, version, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                memo.id,
                memo.lent_by_name,
                memo.borrowed_by_name,
                memo.amount_or_item,
                format_date(memo.loan_date),
                memo.due_date.map(format_date),
                memo.memo,
                memo.status.to_string(),
                memo.version,
                format_timestamp(memo.created_at),
                format_timestamp(memo.updated_at),
            ],
        )?;
        debug!(memo_id = %memo.id, "Inserted memo");
        Ok(())
    }

    async fn get_memo(&self, id: &str) -> LendResult<Option<Memo>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, lent_by_name, borrowed_by_name, amount_or_item, loan_date,
                   due_date, memo, status, version, created_at, updated_at
            FROM memos
            WHERE id = ?1
            "#,
        )?;
        let mut rows = stmt.query([id])?;
        let memo = match rows.next()? {
            Some(row) => Some(Self::row_to_memo(row)?),
            None => None,
        };
        Ok(memo)
    }

    async fn apply_patch(
        &self,
        id: &str,
        patch: &MemoPatch,
        expected_version: Option<i64>,
    ) -> LendResult<()> {
        let mut sets: Vec<&'static str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(ref v) = patch.lent_by_name {
            sets.push("lent_by_name = ?");
            values.push(Value::Text(v.clone()));
        }
        if let Some(ref v) = patch.borrowed_by_name {
            sets.push("borrowed_by_name = ?");
            values.push(Value::Text(v.clone()));
        }
        if let Some(ref v) = patch.amount_or_item {
            sets.push("amount_or_item = ?");
            values.push(Value::Text(v.clone()));
        }
        if let Some(v) = patch.loan_date {
            sets.push("loan_date = ?");
            values.push(Value::Text(format_date(v)));
        }
        if let Some(v) = patch.due_date {
            sets.push("due_date = ?");
            values.push(v.map(format_date).map_or(Value::Null, Value::Text));
        }
        if let Some(ref v) = patch.memo {
            sets.push("memo = ?");
            values.push(v.clone().map_or(Value::Null, Value::Text));
        }
        if let Some(v) = patch.status {
            sets.push("status = ?");
            values.push(Value::Text(v.to_string()));
        }
        sets.push("updated_at = ?");
        values.push(Value::Text(format_timestamp(patch.updated_at)));
        sets.push("version = version + 1");

        let mut sql = format!("UPDATE memos SET {} WHERE id = ?", sets.join(", "));
        values.push(Value::Text(id.to_string()));
        if let Some(expected) = expected_version {
            sql.push_str(" AND version = ?");
            values.push(Value::Integer(expected));
        }

        let conn = self.conn()?;
        let affected = conn.execute(&sql, params_from_iter(values))?;
        if affected > 0 {
            debug!(memo_id = %id, "Applied memo patch");
            return Ok(());
        }

        let actual: Option<i64> = conn
            .query_row("SELECT version FROM memos WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        match (actual, expected_version) {
            (None, _) => Err(LendError::not_found(id)),
            (Some(actual), Some(expected)) => Err(LendError::conflict(expected, Some(actual))),
            (Some(_), None) => Err(LendError::database(format!(
                "update of memo '{}' affected no rows",
                id
            ))),
        }
    }

    async fn append_history(&self, entry: &MemoHistory) -> LendResult<()> {
        let changes = entry
            .changes
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO memo_histories (id, memo_id, editor_name, action, changes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.id,
                entry.memo_id,
                entry.editor_name,
                entry.action.to_string(),
                changes,
                format_timestamp(entry.created_at),
            ],
        )?;
        debug!(memo_id = %entry.memo_id, action = %entry.action, "Appended history entry");
        Ok(())
    }

    async fn list_history(&self, memo_id: &str) -> LendResult<Vec<MemoHistory>> {
        let conn = self.conn()?;
        // rowid breaks ties between entries written within the same microsecond
        let mut stmt = conn.prepare(
            r#"
            SELECT id, memo_id, editor_name, action, changes, created_at
            FROM memo_histories
            WHERE memo_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )?;
        let mut rows = stmt.query([memo_id])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(Self::row_to_history(row)?);
        }
        Ok(entries)
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str) -> LendResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| LendError::corrupt_row(format!("bad date '{}': {}", value, e)))
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> LendResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LendError::corrupt_row(format!("bad timestamp '{}': {}", value, e)))
}
