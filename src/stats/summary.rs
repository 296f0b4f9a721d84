//! Quartile, box-plot and descriptive summaries.
//!
//! All quantiles here are nearest-rank: `sorted[floor(n * p)]`. That is a
//! coarse estimator for small `n`, but it is the one the dashboards have
//! always displayed, so the index formula must not change.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::coerce::field_value;
use super::year::parse_date;
use crate::data::model::Record;

/// Tukey fence multiplier.
const FENCE_K: f64 = 1.5;

/// Box-plot statistics for one group.
///
/// `min`/`max` are whisker ends clamped to the Tukey fences, not the true
/// extrema; values beyond the fences are listed in `outliers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSummary {
    pub group: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub outliers: Vec<f64>,
    /// Valid observations before outlier removal.
    pub count: usize,
}

impl BoxSummary {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// `(lower, upper)` Tukey fences.
    pub fn fences(&self) -> (f64, f64) {
        let iqr = self.iqr();
        (self.q1 - FENCE_K * iqr, self.q3 + FENCE_K * iqr)
    }
}

/// Summary card for a whole series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
}

/// Per-group figures of the statistics panel. Every statistic is `None`
/// when the group has no valid value for its field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub group: String,
    /// Valid values of the mean field.
    pub count: usize,
    pub mean: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
    /// Total of the sum field.
    pub sum: Option<f64>,
}

/// Record-set overview plus per-group figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsOverview {
    pub total_records: usize,
    pub total_groups: usize,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
    /// Ascending by group name.
    pub groups: Vec<GroupStats>,
}

/// `sorted[floor(n * p)]`, with the index clamped into the slice.
/// `sorted` must be non-empty.
pub fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let idx = ((n as f64) * p).floor() as usize;
    sorted[idx.min(n - 1)]
}

fn sort_values(values: &mut [f64]) {
    values.sort_by(f64::total_cmp);
}

/// Box-plot statistics of one group's values. `None` for an empty group.
pub fn summarize_group(group: &str, mut values: Vec<f64>) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }
    sort_values(&mut values);
    let n = values.len();

    let actual_min = values[0];
    let actual_max = values[n - 1];
    let q1 = nearest_rank(&values, 0.25);
    let median = nearest_rank(&values, 0.5);
    let q3 = nearest_rank(&values, 0.75);

    let iqr = q3 - q1;
    let lower = q1 - FENCE_K * iqr;
    let upper = q3 + FENCE_K * iqr;

    let outliers = values
        .iter()
        .copied()
        .filter(|&v| v < lower || v > upper)
        .collect();

    Some(BoxSummary {
        group: group.to_string(),
        min: actual_min.max(lower),
        q1,
        median,
        q3,
        max: actual_max.min(upper),
        outliers,
        count: n,
    })
}

/// One [`BoxSummary`] per distinct group, highest median first.
///
/// Group labels come from the first non-blank field in `category`, trimmed.
/// Records without a label or a valid value for `field` are skipped, and
/// groups left with no values are omitted entirely.
pub fn box_summaries<'a, I>(records: I, category: &[String], field: &str) -> Vec<BoxSummary>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for rec in records {
        let Some(group) = rec.label(category).filter(|g| !g.is_empty()) else {
            continue;
        };
        if let Some(v) = field_value(rec, field) {
            grouped.entry(group).or_default().push(v);
        }
    }

    let mut summaries: Vec<BoxSummary> = grouped
        .into_iter()
        .filter_map(|(group, values)| summarize_group(&group, values))
        .collect();

    // BTreeMap iteration already yields names ascending, so a stable sort
    // on the median alone keeps name order for ties.
    summaries.sort_by(|a, b| b.median.total_cmp(&a.median));
    summaries
}

/// Count, mean, population standard deviation and nearest-rank quartiles of
/// `values`. `None` for an empty series.
pub fn series_summary(values: &[f64]) -> Option<SeriesSummary> {
    if values.is_empty() {
        return None;
    }
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

    let mut sorted = values.to_vec();
    sort_values(&mut sorted);

    Some(SeriesSummary {
        count,
        mean,
        median: nearest_rank(&sorted, 0.5),
        std_dev: variance.sqrt(),
        min: sorted[0],
        max: sorted[count - 1],
        q1: nearest_rank(&sorted, 0.25),
        q3: nearest_rank(&sorted, 0.75),
    })
}

#[derive(Default)]
struct GroupAccumulator {
    count: usize,
    total: f64,
    max: Option<f64>,
    min: Option<f64>,
    sum: Option<f64>,
}

/// Overview of a record set and mean/max/min of `mean_field` with the total
/// of `sum_field` per group.
///
/// `total_records` counts every record; the per-group figures only use
/// values passing the positive-finite rule. Labelled groups without any
/// valid value are still listed.
pub fn group_stats<'a, I>(
    records: I,
    date_fields: &[String],
    category: &[String],
    mean_field: &str,
    sum_field: &str,
) -> StatsOverview
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut total_records = 0;
    let mut span: Option<(NaiveDate, NaiveDate)> = None;
    let mut grouped: BTreeMap<String, GroupAccumulator> = BTreeMap::new();

    for rec in records {
        total_records += 1;
        if let Some(d) = rec
            .first_of(date_fields)
            .and_then(|v| parse_date(&v.to_string()))
        {
            span = Some(span.map_or((d, d), |(lo, hi)| (lo.min(d), hi.max(d))));
        }

        let Some(group) = rec.label(category).filter(|g| !g.is_empty()) else {
            continue;
        };
        let acc = grouped.entry(group).or_default();
        if let Some(v) = field_value(rec, mean_field) {
            acc.count += 1;
            acc.total += v;
            acc.max = Some(acc.max.map_or(v, |m| m.max(v)));
            acc.min = Some(acc.min.map_or(v, |m| m.min(v)));
        }
        if let Some(v) = field_value(rec, sum_field) {
            *acc.sum.get_or_insert(0.0) += v;
        }
    }

    let groups: Vec<GroupStats> = grouped
        .into_iter()
        .map(|(group, acc)| GroupStats {
            group,
            count: acc.count,
            mean: (acc.count > 0).then(|| acc.total / acc.count as f64),
            max: acc.max,
            min: acc.min,
            sum: acc.sum,
        })
        .collect();

    StatsOverview {
        total_records,
        total_groups: groups.len(),
        date_min: span.map(|(lo, _)| lo),
        date_max: span.map(|(_, hi)| hi),
        groups,
    }
}
