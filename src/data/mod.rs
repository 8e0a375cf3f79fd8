/// Data layer: core types, loading, cleaning and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  outcome column → 0/1 + default_label
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  outcome / age / income predicates → new Table
///   └──────────┘
/// ```
pub mod clean;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;

pub use error::{DataError, Result};
