use std::fmt;
use std::str::FromStr;

use log::info;
use serde::Serialize;

use super::error::{DataError, Result};
use super::model::{Table, Value};

/// Raw outcome column.
pub const OUTCOME_COLUMN: &str = "default";
/// Derived human-readable outcome column.
pub const LABEL_COLUMN: &str = "default_label";

// ---------------------------------------------------------------------------
// Outcome – the binary loan result
// ---------------------------------------------------------------------------

/// Loan-approval result, encoded in the `default` column as 0 / 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Outcome {
    #[serde(rename = "Approved")]
    Approved,
    #[serde(rename = "Not Approved")]
    NotApproved,
}

impl Outcome {
    pub const ALL: [Outcome; 2] = [Outcome::Approved, Outcome::NotApproved];

    /// Canonical integer encoding.
    pub fn code(self) -> i64 {
        match self {
            Outcome::Approved => 0,
            Outcome::NotApproved => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Approved => "Approved",
            Outcome::NotApproved => "Not Approved",
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Outcome::Approved),
            1 => Some(Outcome::NotApproved),
            _ => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Outcome::ALL.into_iter().find(|o| o.label() == label)
    }

    /// Recognize a raw outcome cell.
    ///
    /// Accepts integer 0/1 and the text forms `0`, `1`, `'0'`, `'1'`, `:0`
    /// and `:1` left behind by the export tooling. Nothing else.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        match raw {
            Value::Integer(code) => Outcome::from_code(*code),
            Value::String(s) => match s.as_str() {
                "0" | "'0'" | ":0" => Some(Outcome::Approved),
                "1" | "'1'" | ":1" => Some(Outcome::NotApproved),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Outcome {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_choice(s).as_str() {
            "approved" | "0" => Ok(Outcome::Approved),
            "not-approved" | "1" => Ok(Outcome::NotApproved),
            _ => Err(DataError::InvalidArgument(format!("unknown outcome '{s}'"))),
        }
    }
}

/// Lower-case a user choice and unify `_` / space separators to `-`.
pub(crate) fn normalize_choice(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '_' || c == ' ' { '-' } else { c })
        .collect()
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Normalize the outcome column to integer 0/1 and derive `default_label`.
///
/// The input is left untouched. The first unrecognized outcome value aborts
/// cleaning with [`DataError::DataFormat`] naming its (0-based) row.
pub fn clean(table: &Table) -> Result<Table> {
    if !table.has_column(OUTCOME_COLUMN) {
        return Err(DataError::MissingColumn(OUTCOME_COLUMN.to_string()));
    }

    let records = table
        .records
        .iter()
        .enumerate()
        .map(|(row, rec)| {
            let raw = rec.get(OUTCOME_COLUMN);
            let outcome = Outcome::from_raw(raw).ok_or_else(|| DataError::DataFormat {
                row,
                value: raw.clone(),
            })?;
            let mut rec = rec.clone();
            rec.set(OUTCOME_COLUMN, outcome.code());
            rec.set(LABEL_COLUMN, outcome.label());
            Ok(rec)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut column_names = table.column_names.clone();
    if !table.has_column(LABEL_COLUMN) {
        column_names.push(LABEL_COLUMN.to_string());
    }

    info!("cleaned {} records", records.len());
    Ok(Table::new(column_names, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn table_with(values: Vec<Value>) -> Table {
        Table::new(
            vec!["age".into(), OUTCOME_COLUMN.into()],
            values
                .into_iter()
                .map(|v| Record::from_iter([("age", Value::from(30)), (OUTCOME_COLUMN, v)]))
                .collect(),
        )
    }

    #[test]
    fn recognized_encodings() {
        let cases = [
            (Value::Integer(0), 0, "Approved"),
            (Value::Integer(1), 1, "Not Approved"),
            (Value::from("0"), 0, "Approved"),
            (Value::from("1"), 1, "Not Approved"),
            (Value::from("'0'"), 0, "Approved"),
            (Value::from(":0"), 0, "Approved"),
            (Value::from("'1'"), 1, "Not Approved"),
            (Value::from(":1"), 1, "Not Approved"),
        ];
        for (raw, code, label) in cases {
            let cleaned = clean(&table_with(vec![raw.clone()])).unwrap();
            let rec = &cleaned.records[0];
            assert_eq!(rec.get(OUTCOME_COLUMN), &Value::Integer(code), "raw {raw:?}");
            assert_eq!(rec.get(LABEL_COLUMN), &Value::from(label), "raw {raw:?}");
        }
    }

    #[test]
    fn unrecognized_value_names_row_and_value() {
        let table = table_with(vec![Value::from("0"), Value::from("1"), Value::from("yes")]);
        match clean(&table) {
            Err(DataError::DataFormat { row, value }) => {
                assert_eq!(row, 2);
                assert_eq!(value, Value::from("yes"));
            }
            other => panic!("expected DataFormat, got {other:?}"),
        }
    }

    #[test]
    fn rejects_near_misses() {
        for raw in [
            Value::Integer(2),
            Value::Float(0.0),
            Value::Null,
            Value::Bool(true),
            Value::from(" 0"),
            Value::from("0.0"),
        ] {
            let err = clean(&table_with(vec![raw.clone()])).unwrap_err();
            assert!(matches!(err, DataError::DataFormat { row: 0, .. }), "raw {raw:?}");
        }
    }

    #[test]
    fn does_not_mutate_input_and_appends_label_once() {
        let table = table_with(vec![Value::from("'1'")]);
        let before = table.clone();
        let cleaned = clean(&table).unwrap();
        assert_eq!(table, before);
        assert_eq!(cleaned.column_names, vec!["age", OUTCOME_COLUMN, LABEL_COLUMN]);

        let twice = clean(&cleaned).unwrap();
        assert_eq!(twice, cleaned);
    }

    #[test]
    fn missing_outcome_column() {
        let table = Table::new(vec!["age".into()], vec![]);
        assert!(matches!(clean(&table), Err(DataError::MissingColumn(c)) if c == OUTCOME_COLUMN));
    }

    #[test]
    fn outcome_choices() {
        assert_eq!("Not Approved".parse::<Outcome>().unwrap(), Outcome::NotApproved);
        assert_eq!("not_approved".parse::<Outcome>().unwrap(), Outcome::NotApproved);
        assert_eq!("approved".parse::<Outcome>().unwrap(), Outcome::Approved);
        assert!("maybe".parse::<Outcome>().is_err());
        assert_eq!(Outcome::from_label("Approved"), Some(Outcome::Approved));
    }
}
