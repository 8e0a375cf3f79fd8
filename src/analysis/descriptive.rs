use serde::Serialize;

use super::correlation::CORRELATION_COLUMNS;
use crate::data::model::Table;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (`n - 1` denominator), `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile `q` in `[0, 1]` of ascending values, interpolating linearly
/// between the two closest ranks.
///
/// # Panics
///
/// Panics in debug mode if `sorted_values` is not sorted in ascending order.
pub fn quantile_sorted(sorted_values: &[f64], q: f64) -> Option<f64> {
    debug_assert!(
        sorted_values.is_sorted_by(|a, b| a <= b),
        "values must be sorted in ascending order"
    );
    let last = sorted_values.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted_values[lo] + (sorted_values[hi] - sorted_values[lo]) * frac)
}

/// Five-number summary plus count, mean and spread of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; undefined for a single value.
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl DescriptiveStats {
    /// Computes statistics from unsorted values; `None` if there are none.
    pub fn new(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted)
    }

    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        Some(Self {
            count: sorted_values.len(),
            mean: mean(sorted_values)?,
            std: sample_std(sorted_values),
            min,
            q1: quantile_sorted(sorted_values, 0.25)?,
            median: quantile_sorted(sorted_values, 0.5)?,
            q3: quantile_sorted(sorted_values, 0.75)?,
            max,
        })
    }
}

/// Statistics of one numeric column; `None` when it has no values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescription {
    pub column: String,
    pub stats: Option<DescriptiveStats>,
}

/// Per-column statistics of every numeric column, in table order.
///
/// A column is numeric when all its non-missing cells are numbers and it
/// either has one, or is one of the known numeric loan columns.
pub fn describe(table: &Table) -> Vec<ColumnDescription> {
    table
        .column_names
        .iter()
        .filter_map(|col| {
            let present: Vec<_> = table.column(col).filter(|v| !v.is_null()).collect();
            let numeric = present.iter().all(|v| v.as_f64().is_some())
                && (!present.is_empty() || CORRELATION_COLUMNS.contains(&col.as_str()));
            numeric.then(|| ColumnDescription {
                column: col.clone(),
                stats: DescriptiveStats::new(&table.numeric_values(col)),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
        assert_eq!(sample_std(&[5.0]), None);
        let std = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.138_09).abs() < 1e-5);
    }

    #[test]
    fn linear_quantiles() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&values, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&values, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&values, 1.0), Some(4.0));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn describes_unsorted_values() {
        let stats = DescriptiveStats::new(&[5.0, 1.0, 3.0]).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.std, Some(2.0));
        assert!(DescriptiveStats::new(&[]).is_none());
    }

    #[test]
    fn describe_skips_text_columns() {
        use crate::data::model::{Record, Value};

        let table = Table::new(
            vec!["age".into(), "default_label".into(), "income".into()],
            vec![
                Record::from_iter([
                    ("age", Value::from(30)),
                    ("default_label", Value::from("Approved")),
                    ("income", Value::Null),
                ]),
                Record::from_iter([
                    ("age", Value::from(50)),
                    ("default_label", Value::from("Not Approved")),
                    ("income", Value::Null),
                ]),
            ],
        );
        let described = describe(&table);
        let columns: Vec<&str> = described.iter().map(|d| d.column.as_str()).collect();
        assert_eq!(columns, vec!["age", "income"]);
        assert_eq!(described[0].stats.as_ref().map(|s| s.mean), Some(40.0));
        assert_eq!(described[1].stats, None);
    }
}
