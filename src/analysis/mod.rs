//! Aggregations over a (filtered) table: the summary shown as key metrics,
//! and the render-ready datasets behind each chart.

pub mod correlation;
pub mod descriptive;
pub mod distribution;
pub mod summary;

pub use summary::{summarize, Summary};
