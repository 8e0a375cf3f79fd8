//! Credit-risk dataset explorer.
//!
//! Loads loan records, normalizes the outcome column, filters by outcome,
//! age and income, and computes the statistics and chart datasets a view
//! layer renders.
//!
//! ```no_run
//! use credit_lens::data::{clean, filter, loader};
//! use credit_lens::analysis::summarize;
//!
//! # fn main() -> Result<(), credit_lens::data::DataError> {
//! let table = loader::load(&loader::LoadOptions::default())?;
//! let cleaned = clean::clean(&table)?;
//! let predicates = filter::PredicateSet::dashboard_default(&cleaned);
//! let summary = summarize(&filter::apply(&cleaned, &predicates));
//! println!("{} loans", summary.count);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod data;
pub mod state;
pub mod view;
