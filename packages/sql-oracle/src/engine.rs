//! The execution equivalence engine.

use std::path::Path;

use query_equiv::Verdict;
use tracing::{debug, warn};

use crate::compare::{has_ordering_clause, ResultComparator};
use crate::config::DatabaseConfig;
use crate::error::{ConfigError, Error, ExecutionMismatch};
use crate::execute::{Executor, SqliteExecutor};
use crate::log::EXECUTE;

/// Decides whether a predicted query returns the same results as a gold query.
///
/// Both statements run once on the same connection. A failure on either side is a negative verdict
/// naming that side. Row order matters only when the gold SQL contains an `ORDER BY`.
#[derive(Debug, Clone, Default)]
pub struct ExecutionMatcher {
    comparator: ResultComparator,
}

impl ExecutionMatcher {
    pub fn new(comparator: ResultComparator) -> Self {
        Self { comparator }
    }

    pub fn check<E: Executor + ?Sized>(&self, executor: &mut E, predicted: &str, gold: &str) -> Verdict {
        let predicted_table = match executor.execute(predicted) {
            Ok(table) => table,
            Err(err) => {
                warn!(target: EXECUTE, msg = "Predicted query failed", error = err.to_string());
                return Verdict::different(ExecutionMismatch::PredictedFailed(err.to_string()));
            }
        };

        let gold_table = match executor.execute(gold) {
            Ok(table) => table,
            Err(err) => {
                warn!(target: EXECUTE, msg = "Gold query failed", error = err.to_string());
                return Verdict::different(ExecutionMismatch::GoldFailed(err.to_string()));
            }
        };

        let ordered = has_ordering_clause(gold);

        debug!(
            target: EXECUTE,
            msg = "Comparing results",
            predicted_rows = predicted_table.row_count(),
            gold_rows = gold_table.row_count(),
            ordered
        );

        Verdict::from(self.comparator.compare(&predicted_table, &gold_table, ordered))
    }

    /// Opens the SQLite database at `path` for this check only. Failing to open it is a negative
    /// verdict.
    pub fn check_path(&self, path: impl AsRef<Path>, predicted: &str, gold: &str) -> Verdict {
        match SqliteExecutor::open(path) {
            Ok(mut executor) => self.check(&mut executor, predicted, gold),
            Err(err) => Verdict::different(format!("Could not open database: {err}")),
        }
    }
}

/// Opens the configured reference database.
pub fn connect(database: &DatabaseConfig) -> Result<Box<dyn Executor>, Error> {
    if let Some(path) = &database.path {
        return Ok(Box::new(SqliteExecutor::open(path)?));
    }

    match &database.url {
        #[cfg(feature = "postgres")]
        Some(url) => Ok(Box::new(crate::execute::PostgresExecutor::connect(url)?)),
        #[cfg(not(feature = "postgres"))]
        Some(_) => Err(ConfigError::PostgresDisabled.into()),
        None => Err(ConfigError::MissingDatabase.into()),
    }
}

/// `true` when `predicted` and `gold` return equivalent results on `executor`.
pub fn execution_equivalence<E: Executor + ?Sized>(
    predicted: &str,
    gold: &str,
    executor: &mut E,
    ignore_extra_columns: bool,
) -> bool {
    execution_equivalence_verbose(predicted, gold, executor, ignore_extra_columns).is_equivalent()
}

/// Like [`execution_equivalence`], returning the full [`Verdict`] with its diagnostic.
pub fn execution_equivalence_verbose<E: Executor + ?Sized>(
    predicted: &str,
    gold: &str,
    executor: &mut E,
    ignore_extra_columns: bool,
) -> Verdict {
    let comparator = ResultComparator::new().ignore_extra_columns(ignore_extra_columns);
    ExecutionMatcher::new(comparator).check(executor, predicted, gold)
}
