use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use super::descriptive::DescriptiveStats;
use crate::data::clean::{Outcome, LABEL_COLUMN, OUTCOME_COLUMN};
use crate::data::model::{Record, Table, Value};

/// Outcome of a cleaned record, if it has one.
fn outcome_of(record: &Record) -> Option<Outcome> {
    record.get(OUTCOME_COLUMN).as_i64().and_then(Outcome::from_code)
}

// ---------------------------------------------------------------------------
// Categorical counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeCount {
    pub outcome: Outcome,
    pub count: usize,
}

/// Records per outcome label, most frequent first. Absent outcomes are
/// omitted.
pub fn outcome_distribution(table: &Table) -> Vec<OutcomeCount> {
    let mut counts: Vec<OutcomeCount> = Outcome::ALL
        .into_iter()
        .map(|outcome| OutcomeCount {
            outcome,
            count: table
                .column(LABEL_COLUMN)
                .filter(|v| v.as_str() == Some(outcome.label()))
                .count(),
        })
        .filter(|c| c.count > 0)
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: Value,
    pub count: usize,
}

/// Occurrences of each distinct non-missing value, ordered by value.
pub fn value_counts(table: &Table, column: &str) -> Vec<ValueCount> {
    let mut counts: BTreeMap<&Value, usize> = BTreeMap::new();
    for v in table.column(column).filter(|v| !v.is_null()) {
        *counts.entry(v).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.clone(),
            count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Histograms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    /// Exclusive, except for the last bin which also holds `end` itself.
    pub end: f64,
    pub count: usize,
}

/// Equal-width frequency distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Bin `values` into `num_bins` equal-width bins spanning their range.
    pub fn new(values: &[f64], num_bins: usize) -> Self {
        match min_max(values) {
            Some((lo, hi)) => Self::with_range(values, num_bins, lo, hi),
            None => Self::default(),
        }
    }

    /// Bin `values` over the fixed range `[lo, hi]`; values outside are
    /// dropped. A degenerate range collapses to one bin.
    pub fn with_range(values: &[f64], num_bins: usize, lo: f64, hi: f64) -> Self {
        if num_bins == 0 || hi < lo {
            return Self::default();
        }
        let in_range = values.iter().copied().filter(|v| lo <= *v && *v <= hi);
        if hi == lo {
            return Self {
                bins: vec![HistogramBin {
                    start: lo,
                    end: hi,
                    count: in_range.count(),
                }],
            };
        }

        let width = (hi - lo) / num_bins as f64;
        let mut bins: Vec<HistogramBin> = (0..num_bins)
            .map(|i| HistogramBin {
                start: lo + width * i as f64,
                end: if i + 1 == num_bins {
                    hi
                } else {
                    lo + width * (i + 1) as f64
                },
                count: 0,
            })
            .collect();
        for v in in_range {
            let idx = (((v - lo) / width).floor() as usize).min(num_bins - 1);
            bins[idx].count += 1;
        }
        Self { bins }
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().copied().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Histogram of one column.
pub fn histogram(table: &Table, column: &str, num_bins: usize) -> Histogram {
    Histogram::new(&table.numeric_values(column), num_bins)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeHistogram {
    pub outcome: Outcome,
    pub histogram: Histogram,
}

/// One histogram per outcome over shared bin edges, for overlaying.
pub fn grouped_histogram(table: &Table, column: &str, num_bins: usize) -> Vec<OutcomeHistogram> {
    let Some((lo, hi)) = min_max(&table.numeric_values(column)) else {
        return Vec::new();
    };
    Outcome::ALL
        .into_iter()
        .filter_map(|outcome| {
            let values = values_for(table, column, outcome);
            (!values.is_empty()).then(|| OutcomeHistogram {
                outcome,
                histogram: Histogram::with_range(&values, num_bins, lo, hi),
            })
        })
        .collect()
}

fn values_for(table: &Table, column: &str, outcome: Outcome) -> Vec<f64> {
    table
        .records
        .iter()
        .filter(|rec| outcome_of(rec) == Some(outcome))
        .filter_map(|rec| rec.get(column).as_f64())
        .collect()
}

// ---------------------------------------------------------------------------
// Box plots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub outcome: Outcome,
    #[serde(flatten)]
    pub stats: DescriptiveStats,
}

/// Quartile summary of `column` per outcome; outcomes without values are
/// omitted.
pub fn box_stats(table: &Table, column: &str) -> Vec<BoxStats> {
    Outcome::ALL
        .into_iter()
        .filter_map(|outcome| {
            DescriptiveStats::new(&values_for(table, column, outcome))
                .map(|stats| BoxStats { outcome, stats })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Scatter data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub outcome: Option<Outcome>,
}

/// `(x, y)` pairs of two columns, skipping records missing either.
pub fn scatter(table: &Table, x: &str, y: &str) -> Vec<ScatterPoint> {
    table
        .records
        .iter()
        .filter_map(|rec| {
            Some(ScatterPoint {
                x: rec.get(x).as_f64()?,
                y: rec.get(y).as_f64()?,
                outcome: outcome_of(rec),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub outcome: Option<Outcome>,
}

/// Three-column scatter over a random sample of at most `limit` records.
pub fn scatter_3d(
    table: &Table,
    [x, y, z]: [&str; 3],
    limit: usize,
    seed: u64,
) -> Vec<ScatterPoint3> {
    sample_rows(table, limit, seed)
        .records
        .iter()
        .filter_map(|rec| {
            Some(ScatterPoint3 {
                x: rec.get(x).as_f64()?,
                y: rec.get(y).as_f64()?,
                z: rec.get(z).as_f64()?,
                outcome: outcome_of(rec),
            })
        })
        .collect()
}

/// Up to `n` records drawn uniformly without replacement, kept in table
/// order. Deterministic for a given `seed`.
pub fn sample_rows(table: &Table, n: usize, seed: u64) -> Table {
    if n >= table.len() {
        return table.clone();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices = rand::seq::index::sample(&mut rng, table.len(), n).into_vec();
    indices.sort_unstable();
    table.select(&indices)
}
