use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use log::debug;
use serde::Serialize;

use super::clean::{normalize_choice, Outcome, OUTCOME_COLUMN};
use super::error::{DataError, Result};
use super::model::{Record, Table};

pub const AGE_COLUMN: &str = "age";
pub const INCOME_COLUMN: &str = "income";

/// Bounds of the dashboard's age slider.
pub const AGE_SLIDER: RangeInclusive<i64> = 18..=65;

// ---------------------------------------------------------------------------
// Filter predicate: outcome selection plus two inclusive ranges
// ---------------------------------------------------------------------------

/// Which loan outcomes to keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum OutcomeFilter {
    #[default]
    Any,
    Only(Outcome),
}

impl OutcomeFilter {
    pub fn matches(self, record: &Record) -> bool {
        match self {
            OutcomeFilter::Any => true,
            OutcomeFilter::Only(outcome) => {
                record.get(OUTCOME_COLUMN).as_i64() == Some(outcome.code())
            }
        }
    }
}

impl From<Outcome> for OutcomeFilter {
    fn from(outcome: Outcome) -> Self {
        OutcomeFilter::Only(outcome)
    }
}

impl FromStr for OutcomeFilter {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_choice(s).as_str() {
            "any" | "all" => Ok(OutcomeFilter::Any),
            _ => s.parse::<Outcome>().map(OutcomeFilter::Only),
        }
    }
}

impl fmt::Display for OutcomeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeFilter::Any => f.write_str("Any"),
            OutcomeFilter::Only(outcome) => write!(f, "{outcome}"),
        }
    }
}

/// The user-chosen filter conditions: a pure conjunction, so the order in
/// which the three predicates are checked never changes the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredicateSet {
    pub outcome: OutcomeFilter,
    /// Inclusive age bounds.
    pub age: RangeInclusive<i64>,
    /// Inclusive income bounds.
    pub income: RangeInclusive<f64>,
}

impl Default for PredicateSet {
    /// Unbounded: keeps every record with a numeric age and income.
    fn default() -> Self {
        Self {
            outcome: OutcomeFilter::Any,
            age: i64::MIN..=i64::MAX,
            income: f64::NEG_INFINITY..=f64::INFINITY,
        }
    }
}

impl PredicateSet {
    /// Observed `[min, max]` of age and income; any outcome.
    pub fn widest(table: &Table) -> Self {
        let mut set = Self::default();
        if let Some((lo, hi)) = min_max(table, AGE_COLUMN) {
            set.age = lo.floor() as i64..=hi.ceil() as i64;
        }
        if let Some((lo, hi)) = min_max(table, INCOME_COLUMN) {
            set.income = lo..=hi;
        }
        set
    }

    /// The sidebar's initial selection: observed age range clamped into the
    /// slider bounds, income widened outward to whole numbers.
    pub fn dashboard_default(table: &Table) -> Self {
        let mut set = Self::default();
        set.age = AGE_SLIDER;
        if let Some((lo, hi)) = min_max(table, AGE_COLUMN) {
            let lo = (lo.floor() as i64).clamp(*AGE_SLIDER.start(), *AGE_SLIDER.end());
            let hi = (hi.ceil() as i64).clamp(lo, *AGE_SLIDER.end());
            set.age = lo..=hi;
        }
        if let Some((lo, hi)) = min_max(table, INCOME_COLUMN) {
            set.income = lo.floor()..=hi.ceil();
        }
        set
    }

    pub fn with_outcome(mut self, outcome: impl Into<OutcomeFilter>) -> Self {
        self.outcome = outcome.into();
        self
    }

    pub fn with_age(mut self, age: RangeInclusive<i64>) -> Self {
        self.age = age;
        self
    }

    pub fn with_income(mut self, income: RangeInclusive<f64>) -> Self {
        self.income = income;
        self
    }

    /// Whether a single record passes all three predicates.
    ///
    /// A missing or non-numeric age / income never satisfies its range.
    pub fn matches(&self, record: &Record) -> bool {
        let age_ok = record.get(AGE_COLUMN).as_f64().is_some_and(|age| {
            *self.age.start() as f64 <= age && age <= *self.age.end() as f64
        });
        let income_ok = record
            .get(INCOME_COLUMN)
            .as_f64()
            .is_some_and(|income| self.income.contains(&income));

        self.outcome.matches(record) && age_ok && income_ok
    }
}

fn min_max(table: &Table, column: &str) -> Option<(f64, f64)> {
    table
        .column(column)
        .filter_map(|v| v.as_f64())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Return indices of records that pass the predicate set, in table order.
pub fn filtered_indices(table: &Table, predicates: &PredicateSet) -> Vec<usize> {
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| predicates.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

/// Produce the filtered subset as a new table.
///
/// Row order and every column are preserved; the source table is untouched.
/// An empty result is a valid table.
pub fn apply(table: &Table, predicates: &PredicateSet) -> Table {
    let indices = filtered_indices(table, predicates);
    debug!(
        "filter {} / age {:?} / income {:?}: {} of {} rows",
        predicates.outcome,
        predicates.age,
        predicates.income,
        indices.len(),
        table.len()
    );
    table.select(&indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clean::clean;
    use crate::data::model::Value;

    fn loans() -> Table {
        let rows: [(i64, f64, &str); 5] = [
            (25, 1000.0, "0"),
            (40, 5000.0, "'1'"),
            (30, 2500.0, ":0"),
            (65, 5000.0, "1"),
            (18, 999.5, "0"),
        ];
        let raw = Table::new(
            vec!["age".into(), "income".into(), "default".into()],
            rows.iter()
                .map(|&(age, income, d)| {
                    Record::from_iter([
                        ("age", Value::from(age)),
                        ("income", Value::from(income)),
                        ("default", Value::from(d)),
                    ])
                })
                .collect(),
        );
        clean(&raw).unwrap()
    }

    fn ages(table: &Table) -> Vec<i64> {
        table.column("age").filter_map(Value::as_i64).collect()
    }

    #[test]
    fn ranges_are_inclusive_on_both_ends() {
        let table = loans();
        let p = PredicateSet::default().with_age(25..=40).with_income(1000.0..=5000.0);
        assert_eq!(ages(&apply(&table, &p)), vec![25, 40, 30]);
    }

    #[test]
    fn outcome_selection() {
        let table = loans();
        let approved = PredicateSet::default().with_outcome(Outcome::Approved);
        assert_eq!(ages(&apply(&table, &approved)), vec![25, 30, 18]);

        let rejected = PredicateSet::default().with_outcome(Outcome::NotApproved);
        assert_eq!(ages(&apply(&table, &rejected)), vec![40, 65]);
    }

    #[test]
    fn idempotent_under_same_predicates() {
        let table = loans();
        let p = PredicateSet::default()
            .with_outcome(Outcome::Approved)
            .with_age(20..=50);
        let once = apply(&table, &p);
        assert_eq!(apply(&once, &p), once);
    }

    #[test]
    fn widest_predicates_return_input() {
        let table = loans();
        let p = PredicateSet::widest(&table);
        assert_eq!(p.age, 18..=65);
        assert_eq!(p.income, 999.5..=5000.0);
        assert_eq!(apply(&table, &p), table);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let table = loans();
        let p = PredicateSet::default().with_age(70..=90);
        let out = apply(&table, &p);
        assert!(out.is_empty());
        assert_eq!(out.column_names, table.column_names);
    }

    #[test]
    fn missing_age_never_matches() {
        let mut table = loans();
        table.records[0].set("age", Value::Null);
        let out = apply(&table, &PredicateSet::default());
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn dashboard_default_clamps_age_to_slider() {
        let mut table = loans();
        table.records[3].set("age", Value::from(80));
        let p = PredicateSet::dashboard_default(&table);
        assert_eq!(p.age, 18..=65);
        assert_eq!(p.income, 999.0..=5000.0);
        assert_eq!(p.outcome, OutcomeFilter::Any);
    }

    #[test]
    fn outcome_filter_choices() {
        assert_eq!("All".parse::<OutcomeFilter>().unwrap(), OutcomeFilter::Any);
        assert_eq!(
            "not-approved".parse::<OutcomeFilter>().unwrap(),
            OutcomeFilter::Only(Outcome::NotApproved)
        );
        assert!("nope".parse::<OutcomeFilter>().is_err());
    }
}
