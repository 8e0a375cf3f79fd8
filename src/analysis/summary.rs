use log::{debug, warn};
use serde::Serialize;

use super::correlation::{CorrelationMatrix, TargetCorrelation, CORRELATION_COLUMNS};
use super::descriptive::mean;
use crate::data::clean::OUTCOME_COLUMN;
use crate::data::filter::{AGE_COLUMN, INCOME_COLUMN};
use crate::data::model::Table;

/// Missing-value count of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingValue {
    pub column: String,
    pub missing: usize,
    /// Share of rows missing, in percent, rounded to two decimals.
    pub percentage: f64,
}

/// Aggregated statistics of a (filtered) table.
///
/// Every mean or rate is `None` when there is nothing to average; callers
/// show "insufficient data" rather than a zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    /// Mean of the 0/1 outcome column, in `[0, 1]`.
    pub default_rate: Option<f64>,
    pub mean_income: Option<f64>,
    pub mean_age: Option<f64>,
    pub correlation: CorrelationMatrix,
    pub missing_values: Vec<MissingValue>,
}

impl Summary {
    /// Correlation of each numeric column with `target`, strongest first.
    pub fn correlation_with_target(&self, target: &str) -> Vec<TargetCorrelation> {
        self.correlation.with_target(target)
    }

    /// [`Self::correlation_with_target`] against the outcome column.
    pub fn correlation_with_default(&self) -> Vec<TargetCorrelation> {
        self.correlation_with_target(OUTCOME_COLUMN)
    }
}

/// Summarize a cleaned table. Never fails; an empty table yields `count == 0`
/// and undefined statistics.
pub fn summarize(table: &Table) -> Summary {
    let summary = Summary {
        count: table.len(),
        default_rate: mean(&table.numeric_values(OUTCOME_COLUMN)),
        mean_income: mean(&table.numeric_values(INCOME_COLUMN)),
        mean_age: mean(&table.numeric_values(AGE_COLUMN)),
        correlation: CorrelationMatrix::compute(table, &CORRELATION_COLUMNS),
        missing_values: missing_value_report(table),
    };
    if summary.count == 0 {
        warn!("summarizing an empty table: statistics are undefined");
    } else {
        debug!(
            "summary: {} rows, default rate {:?}",
            summary.count, summary.default_rate
        );
    }
    summary
}

/// Columns with at least one missing cell, highest percentage first.
pub fn missing_value_report(table: &Table) -> Vec<MissingValue> {
    if table.is_empty() {
        return Vec::new();
    }
    let rows = table.len() as f64;
    let mut report: Vec<MissingValue> = table
        .column_names
        .iter()
        .filter_map(|col| {
            let missing = table.column(col).filter(|v| v.is_null()).count();
            (missing > 0).then(|| MissingValue {
                column: col.clone(),
                missing,
                percentage: (missing as f64 / rows * 100.0 * 100.0).round() / 100.0,
            })
        })
        .collect();
    report.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    report
}
