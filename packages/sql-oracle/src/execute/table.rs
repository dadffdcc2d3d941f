use std::fmt;

/// A single value returned by a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// The rows returned by a query, with their column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The values of one column, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Keeps only the columns at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> ResultTable {
        let columns = indices
            .iter()
            .filter_map(|&i| self.columns.get(i).cloned())
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().filter_map(|&i| row.get(i).cloned()).collect())
            .collect();

        ResultTable { columns, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> ResultTable {
        ResultTable::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                vec![Value::Integer(1), "x".into(), Value::Null],
                vec![Value::Integer(2), "y".into(), Value::Real(0.5)],
            ],
        )
    }

    #[test]
    fn select_keeps_requested_order() {
        let selected = table().select(&[2, 0]);

        assert_eq!(selected.columns(), &["c".to_string(), "a".to_string()]);
        assert_eq!(
            selected.rows(),
            &[
                vec![Value::Null, Value::Integer(1)],
                vec![Value::Real(0.5), Value::Integer(2)]
            ]
        );
    }

    #[test]
    fn column_reads_top_to_bottom() {
        let table = table();
        let values: Vec<&Value> = table.column(1).collect();

        assert_eq!(values, vec![&Value::from("x"), &Value::from("y")]);
    }
}
