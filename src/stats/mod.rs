/// Statistics layer: pure transforms from records to chart-ready summaries.
///
/// Architecture:
/// ```text
///   &[Record] (after selection)
///        │
///        ▼
///   ┌──────────┐
///   │  coerce   │  field → finite, positive f64 (invalid records dropped)
///   └──────────┘
///        │
///        ├──────────────┬──────────────┬──────────────┬─────────────┐
///        ▼              ▼              ▼              ▼             ▼
///   ┌─────────┐   ┌───────────┐   ┌──────────┐   ┌─────────┐   ┌─────────┐
///   │ summary │   │ histogram │   │ temporal │   │ scatter │   │ ranking │
///   └─────────┘   └───────────┘   └──────────┘   └─────────┘   └─────────┘
///                       │              │              │
///                    sample     year / quarter     sample
/// ```
///
/// Nothing here fails: empty or invalid input yields empty output, and
/// malformed values only remove their own record from the aggregation at
/// hand.

pub mod coerce;
pub mod histogram;
pub mod ranking;
pub mod sample;
pub mod scatter;
pub mod summary;
pub mod temporal;
pub mod year;

pub use coerce::numeric_series;
pub use histogram::{histogram, HistogramBin};
pub use ranking::{rank_groups, GroupRank};
pub use scatter::{scatter_by_group, ScatterPoint};
pub use summary::{
    box_summaries, group_stats, series_summary, BoxSummary, GroupStats, SeriesSummary,
    StatsOverview,
};
pub use temporal::{
    daily_means, quarterly_join, quarterly_stats, year_group_sums, MetricStats, QuarterlyRow,
    TimeSeriesPoint, YearGroupRow, YearGroupTable,
};
pub use year::extract_year;
