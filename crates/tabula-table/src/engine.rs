use std::borrow::Cow;
use std::path::Path;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension, ToSql};
use tracing::{debug, instrument};

use crate::config::DatabaseConfig;
use crate::error::TableError;
use crate::row::{Record, Value};
use crate::sql::TABLE_EXISTS_QUERY;

/// The narrow surface the schema layer needs from a SQL engine.
///
/// Implementations run statements synchronously on a single connection; no
/// transaction or retry semantics are expected.
pub trait SqlEngine {
    /// Runs a statement that returns no rows (DDL).
    fn execute(&self, sql: &str) -> Result<(), TableError>;

    /// Runs a statement with positional `?` parameters and collects every
    /// resulting row.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, TableError>;

    /// Reports whether a table with this exact name exists.
    fn table_exists(&self, table_name: &str) -> Result<bool, TableError>;
}

/// [`SqlEngine`] backed by a single rusqlite [`Connection`].
pub struct SqliteEngine {
    conn: Connection,
}

impl SqliteEngine {
    /// Opens (or creates) a SQLite database at the given file path with the
    /// default pragmas.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TableError> {
        Self::open_with(&DatabaseConfig::default().with_path(path.as_ref()))
    }

    /// Opens an in-memory SQLite database (useful for testing).
    pub fn open_memory() -> Result<Self, TableError> {
        Self::open_with(&DatabaseConfig::memory())
    }

    /// Opens the database named by `config.path` and applies its pragmas.
    #[instrument(skip_all, fields(path = %config.path.display()))]
    pub fn open_with(config: &DatabaseConfig) -> Result<Self, TableError> {
        let conn = if config.is_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.path)?
        };

        let mut pragmas = format!(
            "PRAGMA foreign_keys={};",
            if config.foreign_keys { "ON" } else { "OFF" }
        );
        if !config.is_memory() {
            pragmas.push_str(&format!(" PRAGMA journal_mode={};", config.journal_mode));
        }
        conn.execute_batch(&pragmas)?;

        debug!("Opened SqliteEngine at {}", config.path.display());
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl SqlEngine for SqliteEngine {
    fn execute(&self, sql: &str) -> Result<(), TableError> {
        debug!(sql, "execute");
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, TableError> {
        let sql = sqlite_dialect(sql);
        debug!(sql = %sql, params = params.len(), "query");

        let mut stmt = self.conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                record.push((name.clone(), Value::from(row.get_ref(i)?)));
            }
            records.push(record);
        }

        debug!("Fetched {} rows", records.len());
        Ok(records)
    }

    fn table_exists(&self, table_name: &str) -> Result<bool, TableError> {
        let found: Option<i64> = self
            .conn
            .query_row(TABLE_EXISTS_QUERY, [table_name], |row| row.get(0))
            .optional()?;
        Ok(found == Some(1))
    }
}

/// Translates the portable insert suffix `; RETURNING (a, b)` into SQLite's
/// `RETURNING a, b` clause on the same statement.
fn sqlite_dialect(sql: &str) -> Cow<'_, str> {
    if sql.starts_with("INSERT INTO ") {
        if let Some((statement, returning)) = sql.split_once("; RETURNING ") {
            let columns = returning
                .trim()
                .trim_start_matches('(')
                .trim_end_matches(')');
            return Cow::Owned(format!("{statement} RETURNING {columns}"));
        }
    }
    Cow::Borrowed(sql)
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
            Value::Integer(n) => ToSqlOutput::from(*n),
            Value::Real(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Blob(b) => ToSqlOutput::from(b.as_slice()),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(n) => Value::Integer(n),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}
