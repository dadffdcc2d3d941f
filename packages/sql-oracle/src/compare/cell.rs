use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::execute::Value;

/// A result value in a form that can be sorted, hashed and compared across backends.
///
/// NULL becomes a text sentinel. Reals holding a whole number compare equal to the matching
/// integer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cell {
    Integer(i64),
    Real(Real),
    Text(String),
    Blob(Vec<u8>),
}

impl Cell {
    pub fn new(value: &Value, null_sentinel: &str) -> Self {
        match value {
            Value::Null => Cell::Text(null_sentinel.to_string()),
            Value::Integer(i) => Cell::Integer(*i),
            Value::Real(r) => Cell::from_real(*r),
            Value::Text(s) => Cell::Text(s.clone()),
            Value::Blob(b) => Cell::Blob(b.clone()),
        }
    }

    fn from_real(r: f64) -> Self {
        if r.fract() == 0.0 && r >= i64::MIN as f64 && r < i64::MAX as f64 {
            Cell::Integer(r as i64)
        } else {
            Cell::Real(Real(r))
        }
    }
}

/// A totally ordered `f64`.
#[derive(Debug, Clone, Copy)]
pub struct Real(f64);

impl Real {
    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Real {}

impl PartialOrd for Real {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Real {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Real {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn null_becomes_the_sentinel() {
        assert_eq!(Cell::new(&Value::Null, ""), Cell::Text(String::new()));
        assert_eq!(Cell::new(&Value::Null, "∅"), Cell::Text("∅".into()));
    }

    #[test]
    fn whole_reals_equal_integers() {
        assert_eq!(Cell::new(&Value::Real(3.0), ""), Cell::new(&Value::Integer(3), ""));
        assert_ne!(Cell::new(&Value::Real(3.5), ""), Cell::new(&Value::Integer(3), ""));
        assert_eq!(Cell::new(&Value::Real(-0.0), ""), Cell::Integer(0));
    }

    #[test]
    fn text_never_equals_numbers() {
        assert_ne!(Cell::new(&Value::Text("1".into()), ""), Cell::new(&Value::Integer(1), ""));
    }

    #[test]
    fn cells_sort_totally() {
        let mut cells = vec![
            Cell::new(&Value::Text("b".into()), ""),
            Cell::new(&Value::Real(f64::NAN), ""),
            Cell::new(&Value::Integer(2), ""),
            Cell::new(&Value::Real(0.5), ""),
            Cell::new(&Value::Null, ""),
        ];
        cells.sort();

        assert_eq!(cells[0], Cell::Integer(2));
        assert_eq!(cells[3], Cell::Text(String::new()));
        assert_eq!(cells[4], Cell::Text("b".into()));
    }
}
