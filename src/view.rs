use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::analysis::correlation::{CorrelationMatrix, TargetCorrelation, CORRELATION_COLUMNS};
use crate::analysis::descriptive::{describe, ColumnDescription};
use crate::analysis::distribution::{
    box_stats, grouped_histogram, histogram, outcome_distribution, scatter, scatter_3d,
    value_counts, BoxStats, Histogram, OutcomeCount, OutcomeHistogram, ScatterPoint,
    ScatterPoint3, ValueCount,
};
use crate::analysis::summary::{missing_value_report, MissingValue};
use crate::data::clean::{normalize_choice, OUTCOME_COLUMN};
use crate::data::error::{DataError, Result};
use crate::data::model::Table;

/// Variables offered by the numeric-analysis section.
pub const NUMERIC_VARIABLES: [&str; 8] = [
    "age", "ed", "employ", "address", "income", "debtinc", "creddebt", "othdebt",
];

pub const INCOME_BINS: usize = 30;
pub const SCATTER_3D_LIMIT: usize = 500;
pub const HEAD_ROWS: usize = 10;

// ---------------------------------------------------------------------------
// Section – which group of charts is on screen
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    #[default]
    Overview,
    Numeric,
    Correlation,
    Categorical,
    Advanced,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Overview,
        Section::Numeric,
        Section::Correlation,
        Section::Categorical,
        Section::Advanced,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Overview => "Overview",
            Section::Numeric => "Numeric Analysis",
            Section::Correlation => "Correlations",
            Section::Categorical => "Categorical Variables",
            Section::Advanced => "Advanced Analysis",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Section {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_choice(s).as_str() {
            "overview" => Ok(Section::Overview),
            "numeric" => Ok(Section::Numeric),
            "correlation" | "correlations" => Ok(Section::Correlation),
            "categorical" => Ok(Section::Categorical),
            "advanced" => Ok(Section::Advanced),
            _ => Err(DataError::InvalidArgument(format!("unknown section '{s}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Section datasets
// ---------------------------------------------------------------------------

/// Knobs of the section datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    /// Column of the numeric section; one of [`NUMERIC_VARIABLES`].
    pub variable: String,
    pub bins: usize,
    /// Seed of the 3D scatter sample.
    pub seed: u64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            variable: NUMERIC_VARIABLES[0].to_string(),
            bins: INCOME_BINS,
            seed: 0,
        }
    }
}

/// Everything the view layer needs to draw one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum SectionView {
    Overview {
        outcomes: Vec<OutcomeCount>,
        income: Histogram,
    },
    Numeric {
        variable: String,
        histograms: Vec<OutcomeHistogram>,
        boxes: Vec<BoxStats>,
    },
    Correlation {
        matrix: CorrelationMatrix,
        with_default: Vec<TargetCorrelation>,
    },
    Categorical {
        education: Vec<ValueCount>,
        income_vs_debt: Vec<ScatterPoint>,
    },
    Advanced {
        scatter: Vec<ScatterPoint3>,
        /// Computed over the full, unfiltered table.
        missing_values: Vec<MissingValue>,
        shape: (usize, usize),
        describe: Vec<ColumnDescription>,
        head: Table,
    },
}

/// Build the datasets of `section`. `filtered` drives the charts; the
/// advanced section also reports on the `full` table.
pub fn section_view(
    section: Section,
    filtered: &Table,
    full: &Table,
    options: &ViewOptions,
) -> Result<SectionView> {
    Ok(match section {
        Section::Overview => SectionView::Overview {
            outcomes: outcome_distribution(filtered),
            income: histogram(filtered, "income", INCOME_BINS),
        },
        Section::Numeric => {
            let variable = options.variable.as_str();
            if !NUMERIC_VARIABLES.contains(&variable) {
                return Err(DataError::InvalidArgument(format!(
                    "'{variable}' is not one of {}",
                    NUMERIC_VARIABLES.join(", ")
                )));
            }
            SectionView::Numeric {
                variable: variable.to_string(),
                histograms: grouped_histogram(filtered, variable, options.bins),
                boxes: box_stats(filtered, variable),
            }
        }
        Section::Correlation => {
            let matrix = CorrelationMatrix::compute(filtered, &CORRELATION_COLUMNS);
            let with_default = matrix.with_target(OUTCOME_COLUMN);
            SectionView::Correlation {
                matrix,
                with_default,
            }
        }
        Section::Categorical => SectionView::Categorical {
            education: value_counts(filtered, "ed"),
            income_vs_debt: scatter(filtered, "income", "debtinc"),
        },
        Section::Advanced => SectionView::Advanced {
            scatter: scatter_3d(
                filtered,
                ["age", "income", "debtinc"],
                SCATTER_3D_LIMIT,
                options.seed,
            ),
            missing_values: missing_value_report(full),
            shape: full.shape(),
            describe: describe(full),
            head: full.head(HEAD_ROWS),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clean::clean;
    use crate::data::loader::parse_delimited;

    fn loans() -> Table {
        let text = "age;ed;income;debtinc;default\n\
                    25;1;30;5.5;0\n\
                    41;3;80;12.1;'1'\n\
                    33;;55;;:0\n\
                    52;2;120;3.2;1\n";
        clean(&parse_delimited(text, b';').unwrap()).unwrap()
    }

    #[test]
    fn section_names() {
        for section in Section::ALL {
            let name = format!("{section:?}");
            assert_eq!(name.parse::<Section>().unwrap(), section);
        }
        assert!("pie".parse::<Section>().is_err());
    }

    #[test]
    fn every_section_builds_on_empty_data() {
        let table = loans();
        let empty = table.head(0);
        for section in Section::ALL {
            section_view(section, &empty, &table, &ViewOptions::default()).unwrap();
        }
    }

    #[test]
    fn numeric_section_rejects_unknown_variable() {
        let table = loans();
        let options = ViewOptions {
            variable: "default_label".into(),
            ..Default::default()
        };
        assert!(section_view(Section::Numeric, &table, &table, &options).is_err());
    }

    #[test]
    fn advanced_section_reports_full_table() {
        let table = loans();
        let filtered = table.head(1);
        let SectionView::Advanced {
            scatter,
            missing_values,
            shape,
            head,
            ..
        } = section_view(Section::Advanced, &filtered, &table, &ViewOptions::default()).unwrap()
        else {
            panic!("expected advanced view");
        };
        assert_eq!(scatter.len(), 1);
        assert_eq!(shape, (4, 6));
        assert_eq!(head.len(), 4);
        let columns: Vec<&str> = missing_values.iter().map(|m| m.column.as_str()).collect();
        assert_eq!(columns, vec!["ed", "debtinc"]);
    }

    #[test]
    fn categorical_section_counts_education() {
        let table = loans();
        let SectionView::Categorical {
            education,
            income_vs_debt,
        } = section_view(Section::Categorical, &table, &table, &ViewOptions::default()).unwrap()
        else {
            panic!("expected categorical view");
        };
        assert_eq!(education.len(), 3);
        assert_eq!(income_vs_debt.len(), 3);
    }
}
