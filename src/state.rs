use std::ops::RangeInclusive;

use log::warn;

use crate::analysis::summary::{summarize, Summary};
use crate::data::clean::clean;
use crate::data::error::Result;
use crate::data::filter::{apply, OutcomeFilter, PredicateSet};
use crate::data::loader::{load_source, LoadOptions};
use crate::data::model::Table;
use crate::view::{section_view, Section, SectionView, ViewOptions};

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering.
#[derive(Debug, Default)]
pub struct DashboardState {
    /// Cleaned dataset (None until a file loads successfully).
    pub dataset: Option<Table>,

    /// Current filter selection.
    pub predicates: PredicateSet,

    /// Records passing the current filters (cached).
    pub filtered: Table,

    /// Which group of charts is on screen.
    pub section: Section,

    pub view_options: ViewOptions,

    /// Status / error message for the view layer.
    pub status_message: Option<String>,
}

impl DashboardState {
    /// Load and clean a delimited, JSON or Parquet file. Failures leave the
    /// state without data and describe the problem in `status_message`
    /// instead of propagating.
    pub fn load(&mut self, options: &LoadOptions) -> bool {
        match load_source(options).and_then(|raw| clean(&raw)) {
            Ok(table) => {
                self.set_dataset(table);
                true
            }
            Err(err) => {
                warn!("no data: {err}");
                self.dataset = None;
                self.filtered = Table::default();
                self.status_message = Some(if err.is_not_found() {
                    format!("No data: {err}")
                } else {
                    format!("Could not load data: {err}")
                });
                false
            }
        }
    }

    /// Ingest a cleaned dataset and reset the filters to the sidebar defaults.
    pub fn set_dataset(&mut self, dataset: Table) {
        self.predicates = PredicateSet::dashboard_default(&dataset);
        self.filtered = apply(&dataset, &self.predicates);
        self.dataset = Some(dataset);
        self.status_message = None;
    }

    pub fn has_data(&self) -> bool {
        self.dataset.is_some()
    }

    /// Recompute `filtered` after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filtered = apply(ds, &self.predicates);
        }
    }

    pub fn set_outcome(&mut self, outcome: impl Into<OutcomeFilter>) {
        self.predicates.outcome = outcome.into();
        self.refilter();
    }

    pub fn set_age_range(&mut self, age: RangeInclusive<i64>) {
        self.predicates.age = age;
        self.refilter();
    }

    pub fn set_income_range(&mut self, income: RangeInclusive<f64>) {
        self.predicates.income = income;
        self.refilter();
    }

    /// Replace the whole predicate set at once.
    pub fn set_predicates(&mut self, predicates: PredicateSet) {
        self.predicates = predicates;
        self.refilter();
    }

    /// Back to the sidebar defaults of the loaded dataset.
    pub fn reset_filters(&mut self) {
        if let Some(ds) = &self.dataset {
            self.predicates = PredicateSet::dashboard_default(ds);
            self.filtered = apply(ds, &self.predicates);
        }
    }

    pub fn set_section(&mut self, section: Section) {
        self.section = section;
    }

    /// Key metrics of the filtered view; `None` without data.
    pub fn summary(&self) -> Option<Summary> {
        self.dataset.as_ref().map(|_| summarize(&self.filtered))
    }

    /// Datasets of the active section; `None` without data.
    pub fn section_view(&self) -> Option<Result<SectionView>> {
        self.dataset
            .as_ref()
            .map(|full| section_view(self.section, &self.filtered, full, &self.view_options))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::clean::Outcome;

    fn write_loans(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const LOANS: &str = "age;income;default\n17;20;0\n25;1000;0\n40;5000;'1'\n70;300;:1\n";

    #[test]
    fn missing_file_degrades_to_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = DashboardState::default();
        assert!(!state.load(&LoadOptions::new(dir.path().join("Bankloan.csv"))));
        assert!(!state.has_data());
        assert!(state.summary().is_none());
        assert!(state.section_view().is_none());
        assert!(state.status_message.unwrap().starts_with("No data"));
    }

    #[test]
    fn bad_outcome_value_is_reported() {
        let file = write_loans("age;income;default\n30;100;maybe\n");
        let mut state = DashboardState::default();
        assert!(!state.load(&LoadOptions::new(file.path())));
        let message = state.status_message.unwrap();
        assert!(message.contains("row 0"), "{message}");
        assert!(message.contains("maybe"), "{message}");
    }

    #[test]
    fn filters_start_at_sidebar_defaults() {
        let file = write_loans(LOANS);
        let mut state = DashboardState::default();
        assert!(state.load(&LoadOptions::new(file.path())));
        assert_eq!(state.predicates.age, 18..=65);
        assert_eq!(state.filtered.len(), 2);
    }

    #[test]
    fn every_change_refilters() {
        let file = write_loans(LOANS);
        let mut state = DashboardState::default();
        state.load(&LoadOptions::new(file.path()));

        state.set_age_range(0..=100);
        assert_eq!(state.filtered.len(), 4);

        state.set_outcome(Outcome::NotApproved);
        assert_eq!(state.filtered.len(), 2);
        assert_eq!(state.summary().unwrap().default_rate, Some(1.0));

        state.set_income_range(0.0..=1000.0);
        assert_eq!(state.filtered.len(), 1);

        state.reset_filters();
        assert_eq!(state.filtered.len(), 2);
        assert_eq!(state.predicates.outcome, OutcomeFilter::Any);
    }

    #[test]
    fn loads_parquet_source() {
        use std::sync::Arc;

        use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let batch = RecordBatch::try_from_iter(vec![
            ("age", Arc::new(Int64Array::from(vec![30, 45])) as ArrayRef),
            ("income", Arc::new(Float64Array::from(vec![120.0, 80.5])) as ArrayRef),
            ("default", Arc::new(StringArray::from(vec!["0", ":1"])) as ArrayRef),
        ])
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loans.parquet");
        let mut writer =
            ArrowWriter::try_new(std::fs::File::create(&path).unwrap(), batch.schema(), None)
                .unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let mut state = DashboardState::default();
        assert!(state.load(&LoadOptions::new(&path)), "{:?}", state.status_message);
        assert_eq!(state.filtered.len(), 2);
        assert_eq!(state.summary().unwrap().default_rate, Some(0.5));
    }

    #[test]
    fn section_is_explicit_state() {
        let file = write_loans(LOANS);
        let mut state = DashboardState::default();
        state.load(&LoadOptions::new(file.path()));
        state.set_section(Section::Correlation);
        let view = state.section_view().unwrap().unwrap();
        assert!(matches!(view, SectionView::Correlation { .. }));
    }
}
