//! Compares the result tables of a predicted and a gold query.

mod cell;

pub use cell::{Cell, Real};

use std::collections::BTreeSet;
use std::sync::LazyLock;

use clap::ValueEnum;
use query_equiv::{compare::claim, MatchStrategy};
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::error::ExecutionMismatch;
use crate::execute::ResultTable;
use crate::log::COMPARE;

static ORDER_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\border\s+by\b").expect("ORDER BY pattern is valid"));

/// `true` when the SQL text contains an `ORDER BY`, anywhere. The text is searched as written, so
/// an ordered subquery or window also counts.
pub fn has_ordering_clause(sql: &str) -> bool {
    ORDER_BY.is_match(sql)
}

/// How result tables are compared once their columns line up.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RowComparison {
    /// Compares the set of per-column value tuples. Rows are never reassembled, so two tables whose
    /// columns hold the same values in different row combinations pass.
    #[default]
    #[serde(alias = "ColumnWise", alias = "columnwise", alias = "COLUMNWISE")]
    #[value(name = "columnwise")]
    ColumnWise,
    /// Compares whole rows as a multiset, or as a sequence when order matters.
    #[serde(alias = "RowWise", alias = "rowwise", alias = "ROWWISE")]
    #[value(name = "rowwise")]
    RowWise,
}

/// Decides whether a predicted result table matches a gold one.
#[derive(Debug, Clone, Default)]
pub struct ResultComparator {
    ignore_extra_columns: bool,
    strategy: MatchStrategy,
    comparison: RowComparison,
    null_sentinel: String,
}

impl ResultComparator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops predicted columns with no counterpart in gold before comparing.
    pub fn ignore_extra_columns(mut self, ignore: bool) -> Self {
        self.ignore_extra_columns = ignore;
        self
    }

    pub fn strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn comparison(mut self, comparison: RowComparison) -> Self {
        self.comparison = comparison;
        self
    }

    pub fn null_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.null_sentinel = sentinel.into();
        self
    }

    /// Compares `predicted` with `gold`, respecting row order only when `ordered` is set.
    pub fn compare(
        &self,
        predicted: &ResultTable,
        gold: &ResultTable,
        ordered: bool,
    ) -> Result<(), ExecutionMismatch> {
        let filtered;
        let predicted = if self.ignore_extra_columns {
            filtered = self.required_columns(predicted, gold)?;
            &filtered
        } else {
            predicted
        };

        if predicted.column_count() != gold.column_count() {
            return Err(ExecutionMismatch::ColumnCount {
                predicted: predicted.column_count(),
                gold: gold.column_count(),
            });
        }

        let equal = match self.comparison {
            RowComparison::ColumnWise => {
                self.column_tuples(predicted, ordered) == self.column_tuples(gold, ordered)
            }
            RowComparison::RowWise => self.row_tuples(predicted, ordered) == self.row_tuples(gold, ordered),
        };

        debug!(target: COMPARE, msg = "Compared results", ordered, comparison = ?self.comparison, equal);

        if equal {
            Ok(())
        } else {
            Err(ExecutionMismatch::Values)
        }
    }

    /// Keeps the predicted columns whose value set matches a distinct gold column, in their original
    /// order.
    fn required_columns(
        &self,
        predicted: &ResultTable,
        gold: &ResultTable,
    ) -> Result<ResultTable, ExecutionMismatch> {
        let predicted_sets = self.value_sets(predicted);
        let gold_sets = self.value_sets(gold);

        let kept: Vec<usize> = claim(&predicted_sets, &gold_sets, self.strategy, |p, g| p == g)
            .into_iter()
            .enumerate()
            .filter_map(|(index, claimed)| claimed.map(|_| index))
            .collect();

        debug!(target: COMPARE, msg = "Columns matched by value", ?kept);

        if kept.is_empty() {
            return Err(ExecutionMismatch::MissingRequiredColumns);
        }

        Ok(predicted.select(&kept))
    }

    fn cells<'a>(&'a self, table: &'a ResultTable, column: usize) -> impl Iterator<Item = Cell> + 'a {
        table
            .column(column)
            .map(|value| Cell::new(value, &self.null_sentinel))
    }

    fn value_sets(&self, table: &ResultTable) -> Vec<BTreeSet<Cell>> {
        (0..table.column_count())
            .map(|column| self.cells(table, column).collect())
            .collect()
    }

    fn column_tuples(&self, table: &ResultTable, ordered: bool) -> BTreeSet<Vec<Cell>> {
        (0..table.column_count())
            .map(|column| {
                let mut values: Vec<Cell> = self.cells(table, column).collect();
                if !ordered {
                    values.sort();
                }
                values
            })
            .collect()
    }

    fn row_tuples(&self, table: &ResultTable, ordered: bool) -> Vec<Vec<Cell>> {
        let mut rows: Vec<Vec<Cell>> = table
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|value| Cell::new(value, &self.null_sentinel))
                    .collect()
            })
            .collect();

        if !ordered {
            rows.sort();
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execute::Value;
    use pretty_assertions::assert_eq;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> ResultTable {
        ResultTable::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    fn int(i: i64) -> Value {
        Value::Integer(i)
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn ordering_clause_detection() {
        assert!(has_ordering_clause("SELECT a FROM t ORDER BY a"));
        assert!(has_ordering_clause("select a from t order\n\t by a"));
        assert!(!has_ordering_clause("SELECT a FROM t"));
        assert!(!has_ordering_clause("SELECT border FROM t WHERE by_name = 1"));
    }

    #[test]
    fn row_order_is_ignored_when_unordered() {
        let predicted = table(&["a"], vec![vec![int(2)], vec![int(1)]]);
        let gold = table(&["a"], vec![vec![int(1)], vec![int(2)]]);

        let comparator = ResultComparator::new();

        assert_eq!(comparator.compare(&predicted, &gold, false), Ok(()));
        assert_eq!(
            comparator.compare(&predicted, &gold, true),
            Err(ExecutionMismatch::Values)
        );
    }

    #[test]
    fn column_order_and_names_are_ignored() {
        let predicted = table(&["y", "x"], vec![vec![text("a"), int(1)]]);
        let gold = table(&["x", "y"], vec![vec![int(1), text("a")]]);

        assert_eq!(ResultComparator::new().compare(&predicted, &gold, false), Ok(()));
    }

    #[test]
    fn column_counts_must_agree() {
        let predicted = table(&["a", "b"], vec![vec![int(1), int(2)]]);
        let gold = table(&["a"], vec![vec![int(1)]]);

        assert_eq!(
            ResultComparator::new().compare(&predicted, &gold, false),
            Err(ExecutionMismatch::ColumnCount {
                predicted: 2,
                gold: 1
            })
        );
    }

    #[test]
    fn extra_columns_can_be_ignored() {
        let predicted = table(
            &["id", "name", "extra"],
            vec![
                vec![int(1), text("a"), int(9)],
                vec![int(2), text("b"), int(8)],
            ],
        );
        let gold = table(
            &["name", "id"],
            vec![vec![text("b"), int(2)], vec![text("a"), int(1)]],
        );

        let comparator = ResultComparator::new().ignore_extra_columns(true);

        assert_eq!(comparator.compare(&predicted, &gold, false), Ok(()));
    }

    #[test]
    fn no_matching_column_is_reported() {
        let predicted = table(&["a"], vec![vec![int(5)]]);
        let gold = table(&["b"], vec![vec![int(6)]]);

        assert_eq!(
            ResultComparator::new()
                .ignore_extra_columns(true)
                .compare(&predicted, &gold, false),
            Err(ExecutionMismatch::MissingRequiredColumns)
        );
    }

    #[test]
    fn nulls_compare_through_the_sentinel() {
        let predicted = table(&["a"], vec![vec![Value::Null], vec![int(1)]]);
        let gold = table(&["a"], vec![vec![int(1)], vec![Value::Null]]);

        assert_eq!(ResultComparator::new().compare(&predicted, &gold, false), Ok(()));

        // With the default empty sentinel a NULL is indistinguishable from an empty string
        let gold = table(&["a"], vec![vec![int(1)], vec![text("")]]);
        assert_eq!(ResultComparator::new().compare(&predicted, &gold, false), Ok(()));

        let strict = ResultComparator::new().null_sentinel("\u{0}NULL");
        assert_eq!(
            strict.compare(&predicted, &gold, false),
            Err(ExecutionMismatch::Values)
        );
    }

    // Column-wise comparison sorts each column on its own, so these tables pass even though they
    // share no row. Row-wise comparison tells them apart.
    #[test]
    fn column_wise_accepts_recombined_rows() {
        let predicted = table(&["a", "b"], vec![vec![int(1), int(4)], vec![int(2), int(3)]]);
        let gold = table(&["a", "b"], vec![vec![int(1), int(3)], vec![int(2), int(4)]]);

        assert_eq!(ResultComparator::new().compare(&predicted, &gold, false), Ok(()));
        assert_eq!(
            ResultComparator::new()
                .comparison(RowComparison::RowWise)
                .compare(&predicted, &gold, false),
            Err(ExecutionMismatch::Values)
        );
    }

    #[test]
    fn row_wise_respects_order_when_asked() {
        let predicted = table(&["a"], vec![vec![int(2)], vec![int(1)]]);
        let gold = table(&["a"], vec![vec![int(1)], vec![int(2)]]);

        let comparator = ResultComparator::new().comparison(RowComparison::RowWise);

        assert_eq!(comparator.compare(&predicted, &gold, false), Ok(()));
        assert_eq!(
            comparator.compare(&predicted, &gold, true),
            Err(ExecutionMismatch::Values)
        );
    }

    #[test]
    fn duplicate_columns_collapse_in_the_column_set() {
        let predicted = table(&["a", "b"], vec![vec![int(1), int(1)]]);
        let gold = table(&["a", "b"], vec![vec![int(1), int(1)]]);

        assert_eq!(ResultComparator::new().compare(&predicted, &gold, false), Ok(()));
    }
}
