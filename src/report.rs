use std::fmt::{self, Write};

use serde::Serialize;

use credit_lens::analysis::summary::Summary;
use credit_lens::data::filter::PredicateSet;
use credit_lens::data::model::Table;
use credit_lens::view::{Section, SectionView};

const INSUFFICIENT: &str = "insufficient data";

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct Report<'a> {
    pub predicates: &'a PredicateSet,
    pub section: Section,
    pub summary: &'a Summary,
    pub view: &'a SectionView,
}

// ---------------------------------------------------------------------------
// Plain text
// ---------------------------------------------------------------------------

/// `1234567` → `1,234,567`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn or_insufficient(value: Option<f64>, fmt: impl Fn(f64) -> String) -> String {
    value.map(fmt).unwrap_or_else(|| INSUFFICIENT.to_string())
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

pub fn render_text(report: &Report<'_>) -> String {
    let mut out = String::new();
    // Writing into a `String` cannot fail.
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &Report<'_>) -> fmt::Result {
    let s = report.summary;
    let p = report.predicates;

    writeln!(
        out,
        "Filters: outcome={} age={}..={} income={}..={}",
        p.outcome,
        p.age.start(),
        p.age.end(),
        p.income.start(),
        p.income.end()
    )?;
    writeln!(out)?;
    writeln!(out, "== Key Metrics ==")?;
    writeln!(out, "Total loans:    {}", thousands(s.count as u64))?;
    writeln!(
        out,
        "Default rate:   {}",
        or_insufficient(s.default_rate, |r| format!("{:.2}%", r * 100.0))
    )?;
    writeln!(
        out,
        "Average income: {}",
        or_insufficient(s.mean_income, |v| format!(
            "${}",
            thousands(v.round().max(0.0) as u64)
        ))
    )?;
    writeln!(
        out,
        "Average age:    {}",
        or_insufficient(s.mean_age, |v| format!("{v:.1} years"))
    )?;
    writeln!(out)?;
    writeln!(out, "== {} ==", report.section)?;
    write_section(out, report.view)
}

fn write_section(out: &mut String, view: &SectionView) -> fmt::Result {
    match view {
        SectionView::Overview { outcomes, income } => {
            let total: usize = outcomes.iter().map(|c| c.count).sum();
            writeln!(out, "Loan distribution:")?;
            for c in outcomes {
                writeln!(
                    out,
                    "  {:<14} {:>8}  {:>6.2}%",
                    c.outcome.label(),
                    thousands(c.count as u64),
                    c.count as f64 / total as f64 * 100.0
                )?;
            }
            writeln!(out, "Income distribution:")?;
            for bin in &income.bins {
                writeln!(out, "  [{:>10.2}, {:>10.2}] {}", bin.start, bin.end, bin.count)?;
            }
        }
        SectionView::Numeric {
            variable,
            histograms,
            boxes,
        } => {
            writeln!(out, "Distribution of {variable}:")?;
            for group in histograms {
                writeln!(out, "  {}", group.outcome.label())?;
                for bin in &group.histogram.bins {
                    writeln!(out, "    [{:>10.2}, {:>10.2}] {}", bin.start, bin.end, bin.count)?;
                }
            }
            writeln!(out, "Box plot of {variable}:")?;
            for b in boxes {
                let st = &b.stats;
                writeln!(
                    out,
                    "  {:<14} n={} min={:.2} q1={:.2} median={:.2} q3={:.2} max={:.2}",
                    b.outcome.label(),
                    st.count,
                    st.min,
                    st.q1,
                    st.median,
                    st.q3,
                    st.max
                )?;
            }
        }
        SectionView::Correlation {
            matrix,
            with_default,
        } => {
            write!(out, "{:>9}", "")?;
            for col in &matrix.columns {
                write!(out, " {col:>8}")?;
            }
            writeln!(out)?;
            for (col, row) in matrix.columns.iter().zip(&matrix.values) {
                write!(out, "{col:>9}")?;
                for v in row {
                    write!(out, " {:>8}", cell(*v))?;
                }
                writeln!(out)?;
            }
            writeln!(out, "Correlation with default:")?;
            for t in with_default {
                writeln!(out, "  {:<10} {}", t.column, cell(t.r))?;
            }
        }
        SectionView::Categorical {
            education,
            income_vs_debt,
        } => {
            writeln!(out, "Education level:")?;
            for c in education {
                writeln!(out, "  {:<6} {}", c.value.to_string(), c.count)?;
            }
            writeln!(out, "Income vs debt ratio: {} points", income_vs_debt.len())?;
        }
        SectionView::Advanced {
            scatter,
            missing_values,
            shape,
            describe,
            head,
        } => {
            writeln!(out, "3D scatter (age, income, debtinc): {} points", scatter.len())?;
            if missing_values.is_empty() {
                writeln!(out, "No missing values in the dataset")?;
            } else {
                writeln!(out, "Missing values:")?;
                for m in missing_values {
                    writeln!(out, "  {:<14} {:>6} {:>6.2}%", m.column, m.missing, m.percentage)?;
                }
            }
            writeln!(
                out,
                "Dimensions: {} rows x {} columns",
                thousands(shape.0 as u64),
                shape.1
            )?;
            writeln!(out, "Descriptive statistics:")?;
            for d in describe {
                match &d.stats {
                    Some(st) => {
                        writeln!(
                            out,
                            "  {:<10} count={} mean={:.2} std={} min={:.2} 25%={:.2} 50%={:.2} 75%={:.2} max={:.2}",
                            d.column,
                            st.count,
                            st.mean,
                            cell(st.std),
                            st.min,
                            st.q1,
                            st.median,
                            st.q3,
                            st.max
                        )?;
                    }
                    None => {
                        writeln!(out, "  {:<10} count=0", d.column)?;
                    }
                }
            }
            writeln!(out, "Sample:")?;
            write_rows(out, head)?;
        }
    }
    Ok(())
}

fn write_rows(out: &mut String, table: &Table) -> fmt::Result {
    writeln!(out, "  {}", table.column_names.join(" | "))?;
    for rec in &table.records {
        let cells: Vec<String> = table
            .column_names
            .iter()
            .map(|c| rec.get(c).to_string())
            .collect();
        writeln!(out, "  {}", cells.join(" | "))?;
    }
    Ok(())
}
