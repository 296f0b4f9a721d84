/// Data layer: core types, loading, and selection.
///
/// Architecture:
/// ```text
///  .json / .csv / .parquet / API payload
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse → RecordSet
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ RecordSet │  Vec<Record>, column index
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  groups / year / date range → selected indices
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
