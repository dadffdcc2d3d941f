//! Runs SQL against a reference database.

#[cfg(feature = "postgres")]
mod postgres;
mod sqlite;
mod table;

#[cfg(feature = "postgres")]
pub use postgres::PostgresExecutor;
pub use sqlite::SqliteExecutor;
pub use table::{ResultTable, Value};

use crate::error::ExecutionError;

/// A read-only connection able to run a query and return its rows.
///
/// Nulls are reported as [`Value::Null`]. A connection is released when the executor is dropped.
pub trait Executor {
    fn execute(&mut self, sql: &str) -> Result<ResultTable, ExecutionError>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn execute(&mut self, sql: &str) -> Result<ResultTable, ExecutionError> {
        (**self).execute(sql)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&mut self, sql: &str) -> Result<ResultTable, ExecutionError> {
        (**self).execute(sql)
    }
}
