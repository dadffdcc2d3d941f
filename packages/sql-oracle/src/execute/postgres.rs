use tokio::runtime::{Builder, Runtime};
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{debug, warn};

use super::{Executor, ResultTable, Value};
use crate::error::ExecutionError;
use crate::log::EXECUTE;

/// Runs queries on PostgreSQL through a private current-thread runtime.
///
/// The session is switched to read-only transactions on connect. Values come back in text form and
/// are read as integers or reals where they parse as such, which is consistent for both sides of a
/// comparison run on the same connection.
pub struct PostgresExecutor {
    runtime: Runtime,
    client: Client,
}

impl PostgresExecutor {
    pub fn connect(url: &str) -> Result<Self, ExecutionError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ExecutionError::Runtime)?;

        let (client, connection) = runtime.block_on(tokio_postgres::connect(url, NoTls))?;

        runtime.spawn(async move {
            if let Err(err) = connection.await {
                warn!(target: EXECUTE, msg = "PostgreSQL connection closed", error = err.to_string());
            }
        });

        runtime.block_on(
            client.batch_execute("SET SESSION CHARACTERISTICS AS TRANSACTION READ ONLY"),
        )?;

        debug!(target: EXECUTE, msg = "Connected to PostgreSQL");

        Ok(Self { runtime, client })
    }
}

impl Executor for PostgresExecutor {
    fn execute(&mut self, sql: &str) -> Result<ResultTable, ExecutionError> {
        let messages = self.runtime.block_on(self.client.simple_query(sql))?;

        let mut columns = Vec::new();
        let mut rows = Vec::new();

        for message in messages {
            match message {
                SimpleQueryMessage::RowDescription(description) => {
                    columns = description.iter().map(|c| c.name().to_string()).collect();
                }
                SimpleQueryMessage::Row(row) => {
                    if columns.is_empty() {
                        columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                    }
                    rows.push((0..row.len()).map(|i| value(row.get(i))).collect());
                }
                _ => {}
            }
        }

        debug!(target: EXECUTE, msg = "Executed", sql, columns = columns.len(), rows = rows.len());

        Ok(ResultTable::new(columns, rows))
    }
}

fn value(text: Option<&str>) -> Value {
    match text {
        None => Value::Null,
        Some(text) => text
            .parse::<i64>()
            .map(Value::Integer)
            .or_else(|_| text.parse::<f64>().map(Value::Real))
            .unwrap_or_else(|_| Value::Text(text.to_string())),
    }
}
