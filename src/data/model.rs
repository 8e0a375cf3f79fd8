use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Value – a single cell in a table column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
/// Value counts key a `BTreeMap` by `Value`, so it must be `Ord`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// A missing cell.
    Null,
}

// -- Manual Eq/Ord so Value can key a BTreeMap --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                String(_) => 3,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            // Mixed numeric columns sort by magnitude, integers first on ties.
            (Integer(a), Float(b)) => (*a as f64)
                .total_cmp(b)
                .then(std::cmp::Ordering::Less),
            (Float(a), Integer(b)) => a
                .total_cmp(&(*b as f64))
                .then(std::cmp::Ordering::Greater),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl Value {
    /// Try to interpret the value as an `f64` for numeric statistics.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) if v.is_finite() => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the cell counts as missing.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(v) => v.is_nan(),
            _ => false,
        }
    }
}

static MISSING: Value = Value::Null;

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// A single loan record (one row of the source file).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    /// Dynamic columns: column_name → value.
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Value of `column`, or null when the record has no such column.
    pub fn get(&self, column: &str) -> &Value {
        self.fields.get(column).unwrap_or(&MISSING)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(column.into(), value.into());
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// An ordered, immutable collection of records with named columns.
///
/// `column_names` keeps the declaration order of the source header; every
/// operation that derives a new table preserves it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    /// Ordered list of column names.
    pub column_names: Vec<String>,
    /// All records (rows), in source order.
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(column_names: Vec<String>, records: Vec<Record>) -> Self {
        Table {
            column_names,
            records,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.records.len(), self.column_names.len())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Iterate over one column, yielding null for records lacking it.
    pub fn column<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.records.iter().map(move |rec| rec.get(column))
    }

    /// Numeric view of a column; missing and non-numeric cells are `None`.
    pub fn numeric_column(&self, column: &str) -> Vec<Option<f64>> {
        self.column(column).map(Value::as_f64).collect()
    }

    /// Non-missing numeric values of a column.
    pub fn numeric_values(&self, column: &str) -> Vec<f64> {
        self.column(column).filter_map(Value::as_f64).collect()
    }

    /// The first `n` records.
    pub fn head(&self, n: usize) -> Table {
        Table {
            column_names: self.column_names.clone(),
            records: self.records.iter().take(n).cloned().collect(),
        }
    }

    /// A new table with the records at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Table {
        Table {
            column_names: self.column_names.clone(),
            records: indices
                .iter()
                .filter_map(|&i| self.records.get(i))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["age".into(), "income".into(), "note".into()],
            vec![
                Record::from_iter([("age", Value::from(30)), ("income", Value::from(1200.5))]),
                Record::from_iter([
                    ("age", Value::Null),
                    ("income", Value::from(800)),
                    ("note", Value::from("x")),
                ]),
            ],
        )
    }

    #[test]
    fn absent_cells_read_as_null() {
        let table = sample();
        assert_eq!(table.records[0].get("note"), &Value::Null);
        assert_eq!(table.numeric_column("age"), vec![Some(30.0), None]);
        assert_eq!(table.numeric_values("income"), vec![1200.5, 800.0]);
    }

    #[test]
    fn shape_head_and_select() {
        let table = sample();
        assert_eq!(table.shape(), (2, 3));
        assert_eq!(table.head(1).len(), 1);
        assert_eq!(table.head(10).len(), 2);
        let picked = table.select(&[1]);
        assert_eq!(picked.records[0].get("note"), &Value::from("x"));
        assert_eq!(picked.column_names, table.column_names);
    }

    #[test]
    fn mixed_numeric_values_sort_by_magnitude() {
        let mut values = vec![Value::Float(2.5), Value::Integer(3), Value::Integer(1)];
        values.sort();
        assert_eq!(
            values,
            vec![Value::Integer(1), Value::Float(2.5), Value::Integer(3)]
        );
        assert!(Value::Null < Value::Integer(0));
    }

    #[test]
    fn nan_floats_are_missing() {
        assert!(Value::Float(f64::NAN).is_null());
        assert_eq!(Value::Float(f64::NAN).as_f64(), None);
        assert!(!Value::Integer(0).is_null());
    }
}
