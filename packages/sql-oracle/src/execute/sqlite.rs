use std::path::Path;

use rusqlite::{types::ValueRef, Connection, OpenFlags};
use tracing::{debug, warn};

use super::{Executor, ResultTable, Value};
use crate::error::ExecutionError;
use crate::log::EXECUTE;

/// Runs queries on a SQLite database.
///
/// Files are opened read-only. Every statement is also checked with `sqlite3_stmt_readonly` before
/// it runs, which covers connections handed in by the caller.
pub struct SqliteExecutor {
    connection: Connection,
}

impl SqliteExecutor {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExecutionError> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let connection = Connection::open_with_flags(path, flags)?;

        debug!(target: EXECUTE, msg = "Opened SQLite database", path = %path.display());

        Ok(Self { connection })
    }

    /// Wraps an existing connection, such as an in-memory fixture.
    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl Executor for SqliteExecutor {
    fn execute(&mut self, sql: &str) -> Result<ResultTable, ExecutionError> {
        let mut statement = self.connection.prepare(sql)?;

        if !statement.readonly() {
            warn!(target: EXECUTE, msg = "Refusing to run a statement that writes", sql);
            return Err(ExecutionError::NotReadOnly);
        }

        let columns: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = statement.query([])?;

        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for index in 0..width {
                values.push(value(row.get_ref(index)?));
            }
            rows.push(values);
        }

        debug!(target: EXECUTE, msg = "Executed", sql, columns = width, rows = rows.len());

        Ok(ResultTable::new(columns, rows))
    }
}

fn value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}
