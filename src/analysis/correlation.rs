use std::cmp::Ordering;

use serde::Serialize;

use crate::data::model::Table;

/// Numeric columns entering the correlation matrix, in declaration order.
pub const CORRELATION_COLUMNS: [&str; 9] = [
    "age", "ed", "employ", "address", "income", "debtinc", "creddebt", "othdebt", "default",
];

/// Pearson correlation matrix. `None` marks an undefined coefficient: fewer
/// than two complete pairs, or a constant column on either side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `values[i][j] == values[j][i]`.
    pub values: Vec<Vec<Option<f64>>>,
}

/// One entry of a correlation column against a target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetCorrelation {
    pub column: String,
    pub r: Option<f64>,
}

impl CorrelationMatrix {
    /// Correlate `columns` of `table` using pairwise-complete rows. Columns
    /// absent from the table count as entirely missing.
    pub fn compute(table: &Table, columns: &[&str]) -> Self {
        let data: Vec<Vec<Option<f64>>> =
            columns.iter().map(|c| table.numeric_column(c)).collect();
        let n = columns.len();
        let mut values = vec![vec![None; n]; n];

        for i in 0..n {
            values[i][i] = pearson(&data[i], &data[i]).map(|_| 1.0);
            for j in (i + 1)..n {
                let r = pearson(&data[i], &data[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        CorrelationMatrix {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            values,
        }
    }

    fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.values[self.index_of(a)?][self.index_of(b)?]
    }

    /// Whether no coefficient at all is defined.
    pub fn is_undefined(&self) -> bool {
        self.values.iter().flatten().all(Option::is_none)
    }

    /// Correlations of every other column with `target`, strongest first.
    ///
    /// Sorted by absolute value descending; ties keep declaration order and
    /// undefined coefficients go last. Empty if `target` is not a column.
    pub fn with_target(&self, target: &str) -> Vec<TargetCorrelation> {
        let Some(t) = self.index_of(target) else {
            return Vec::new();
        };
        let mut out: Vec<TargetCorrelation> = self
            .columns
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != t)
            .map(|(i, column)| TargetCorrelation {
                column: column.clone(),
                r: self.values[i][t],
            })
            .collect();
        // `sort_by` is stable, so ties keep declaration order.
        out.sort_by(|a, b| match (a.r, b.r) {
            (Some(x), Some(y)) => y.abs().total_cmp(&x.abs()),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        out
    }
}

/// Pearson's r over the rows where both sides are present.
fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2
        || is_constant(pairs.iter().map(|p| p.0))
        || is_constant(pairs.iter().map(|p| p.1))
    {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    // Deviations are scaled to [-1, 1] so the sums of squares stay finite.
    let scale_x = pairs.iter().map(|p| (p.0 - mean_x).abs()).fold(0.0, f64::max);
    let scale_y = pairs.iter().map(|p| (p.1 - mean_y).abs()).fold(0.0, f64::max);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in &pairs {
        let dx = (x - mean_x) / scale_x;
        let dy = (y - mean_y) / scale_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let r = sxy / (sxx * syy).sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

fn is_constant(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Record, Value};

    fn table(rows: &[(i64, f64, f64, i64)]) -> Table {
        Table::new(
            vec!["age".into(), "income".into(), "debtinc".into(), "default".into()],
            rows.iter()
                .map(|&(age, income, debtinc, d)| {
                    Record::from_iter([
                        ("age", Value::from(age)),
                        ("income", Value::from(income)),
                        ("debtinc", Value::from(debtinc)),
                        ("default", Value::from(d)),
                    ])
                })
                .collect(),
        )
    }

    const COLS: [&str; 4] = ["age", "income", "debtinc", "default"];

    #[test]
    fn perfect_linear_relationships() {
        let t = table(&[(20, 100.0, 9.0, 0), (30, 200.0, 6.0, 0), (40, 300.0, 3.0, 1)]);
        let m = CorrelationMatrix::compute(&t, &COLS);
        assert!((m.get("age", "income").unwrap() - 1.0).abs() < 1e-12);
        assert!((m.get("age", "debtinc").unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(m.get("income", "income"), Some(1.0));
    }

    #[test]
    fn symmetric_with_unit_diagonal() {
        let t = table(&[
            (23, 50.0, 4.1, 0),
            (35, 120.5, 12.0, 1),
            (41, 77.0, 2.2, 0),
            (52, 300.0, 18.9, 1),
            (29, 31.0, 9.5, 0),
        ]);
        let m = CorrelationMatrix::compute(&t, &COLS);
        for i in 0..COLS.len() {
            assert_eq!(m.values[i][i], Some(1.0));
            for j in 0..COLS.len() {
                assert_eq!(m.values[i][j], m.values[j][i]);
            }
        }
    }

    #[test]
    fn constant_column_is_undefined() {
        let t = table(&[(30, 100.0, 1.0, 0), (40, 100.0, 2.0, 1), (50, 100.0, 3.0, 0)]);
        let m = CorrelationMatrix::compute(&t, &COLS);
        assert_eq!(m.get("income", "income"), None);
        assert_eq!(m.get("income", "age"), None);
        assert!(m.get("age", "debtinc").is_some());
    }

    #[test]
    fn extreme_magnitudes_stay_finite() {
        let huge = [Some(1e200), Some(2e200), Some(3e200)];
        let small = [Some(1.0), Some(2.0), Some(3.0)];
        let r = pearson(&huge, &small).unwrap();
        assert!((r - 1.0).abs() < 1e-12, "{r}");

        let overflowing = [Some(f64::MAX), Some(f64::MAX / 2.0), Some(0.0)];
        assert_eq!(pearson(&overflowing, &small), None);
    }

    #[test]
    fn single_row_is_fully_undefined() {
        let t = table(&[(40, 5000.0, 10.0, 1)]);
        assert!(CorrelationMatrix::compute(&t, &COLS).is_undefined());
    }

    #[test]
    fn uses_pairwise_complete_rows() {
        let mut t = table(&[
            (20, 1.0, 0.0, 0),
            (30, 2.0, 0.0, 0),
            (40, 3.0, 0.0, 1),
            (50, 0.0, 0.0, 1),
        ]);
        t.records[3].set("income", Value::Null);
        let m = CorrelationMatrix::compute(&t, &COLS);
        assert!((m.get("age", "income").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn target_column_sorted_by_strength() {
        let m = CorrelationMatrix {
            columns: vec!["a".into(), "b".into(), "c".into(), "d".into(), "default".into()],
            values: vec![
                vec![Some(1.0), None, None, None, Some(0.2)],
                vec![None, Some(1.0), None, None, Some(-0.5)],
                vec![None, None, Some(1.0), None, None],
                vec![None, None, None, Some(1.0), Some(0.5)],
                vec![Some(0.2), Some(-0.5), None, Some(0.5), Some(1.0)],
            ],
        };
        let ranked = m.with_target("default");
        let order: Vec<&str> = ranked.iter().map(|t| t.column.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
        assert!(m.with_target("missing").is_empty());
    }
}
