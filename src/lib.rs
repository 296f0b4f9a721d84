//! Descriptive-statistics and aggregation engine behind the municipal
//! radiance and GDP dashboards.
//!
//! Records come in through [`data::loader`], are narrowed by a
//! [`data::filter::Selection`], and are turned into chart-ready structures by
//! the pure transforms in [`stats`]. [`state::DashboardState`] ties these
//! together and memoizes each view until its inputs change.

pub mod color;
pub mod config;
pub mod data;
pub mod state;
pub mod stats;

pub use config::EngineConfig;
pub use data::filter::{DateRange, Selection};
pub use data::model::{FieldValue, Record, RecordSet};
pub use state::DashboardState;
