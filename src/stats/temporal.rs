use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::coerce::field_value;
use super::summary::nearest_rank;
use super::year::{date_key, extract_year, quarter_key};
use crate::config::YearBounds;
use crate::data::model::Record;

// ---------------------------------------------------------------------------
// Daily mean series
// ---------------------------------------------------------------------------

/// Mean of one metric over all records sharing a date key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub key: String,
    pub value: f64,
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

/// One mean-aggregated point per distinct day, ascending by key.
///
/// Records without a date or without a valid `field` value are dropped
/// before grouping.
pub fn daily_means<'a, I>(records: I, date_fields: &[String], field: &str) -> Vec<TimeSeriesPoint>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut grouped: BTreeMap<String, Accumulator> = BTreeMap::new();
    for rec in records {
        let Some(key) = rec.first_of(date_fields).and_then(date_key) else {
            continue;
        };
        let Some(v) = field_value(rec, field) else {
            continue;
        };
        let acc = grouped.entry(key).or_default();
        acc.sum += v;
        acc.count += 1;
    }

    grouped
        .into_iter()
        .map(|(key, acc)| TimeSeriesPoint {
            key,
            value: acc.sum / acc.count as f64,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Year × group sums
// ---------------------------------------------------------------------------

/// Key of the year column in a flattened [`YearGroupRow`].
pub const YEAR_COLUMN: &str = "year";

/// One row of the wide year × group table.
///
/// Serializes flat, `{"year": 2021, "Toluca": 12.5, "Metepec": null}`;
/// `None` means the group had no records that year and must not be drawn as
/// zero. Group keys never equal [`YEAR_COLUMN`]; see [`year_group_sums`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearGroupRow {
    pub year: i32,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl YearGroupRow {
    /// Sum for `group` in this year; `None` both for "no data" and for an
    /// unknown group.
    pub fn get(&self, group: &str) -> Option<f64> {
        self.values.get(group).copied().flatten()
    }
}

/// Sparse wide table of per-(year, group) sums.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearGroupTable {
    /// Every group with at least one contributing record, sorted.
    pub groups: Vec<String>,
    /// One row per year present, ascending.
    pub rows: Vec<YearGroupRow>,
}

impl YearGroupTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Sum `field` per (year, group).
///
/// This is a volume metric, so values are summed rather than averaged.
/// Records lacking a group label, a valid value, or a year inside `bounds`
/// do not contribute. A group labelled `year` is published as `year_` (with
/// more underscores if that is taken too) so flattened rows stay unique.
pub fn year_group_sums<'a, I>(
    records: I,
    date_fields: &[String],
    category: &[String],
    field: &str,
    bounds: &YearBounds,
) -> YearGroupTable
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut sums: BTreeMap<(i32, String), f64> = BTreeMap::new();
    let mut groups: BTreeSet<String> = BTreeSet::new();
    let mut years: BTreeSet<i32> = BTreeSet::new();

    for rec in records {
        let Some(group) = rec.label(category).filter(|g| !g.is_empty()) else {
            continue;
        };
        let Some(v) = field_value(rec, field) else {
            continue;
        };
        let Some(year) = rec
            .first_of(date_fields)
            .and_then(|d| extract_year(d, bounds))
        else {
            continue;
        };
        groups.insert(group.clone());
        years.insert(year);
        *sums.entry((year, group)).or_insert(0.0) += v;
    }

    if groups.remove(YEAR_COLUMN) {
        let mut renamed = format!("{YEAR_COLUMN}_");
        while groups.contains(&renamed) {
            renamed.push('_');
        }
        sums = sums
            .into_iter()
            .map(|((year, g), v)| {
                let g = if g == YEAR_COLUMN { renamed.clone() } else { g };
                ((year, g), v)
            })
            .collect();
        groups.insert(renamed);
    }

    let rows = years
        .into_iter()
        .map(|year| YearGroupRow {
            year,
            values: groups
                .iter()
                .map(|g| (g.clone(), sums.get(&(year, g.clone())).copied()))
                .collect(),
        })
        .collect();

    YearGroupTable {
        groups: groups.into_iter().collect(),
        rows,
    }
}

// ---------------------------------------------------------------------------
// Quarterly aggregation
// ---------------------------------------------------------------------------

/// Distribution figures of one metric over one quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    /// Nearest-rank median.
    pub median: f64,
    /// Sample standard deviation; 0 below two values.
    pub std: f64,
}

impl MetricStats {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let sum: f64 = values.iter().sum();
        let mean = sum / count as f64;
        let std = if count < 2 {
            0.0
        } else {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        };
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(MetricStats {
            count,
            sum,
            mean,
            median: nearest_rank(&sorted, 0.5),
            std,
        })
    }
}

/// Radiance and GDP figures for a quarter present in both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyRow {
    pub quarter: String,
    pub radiance: MetricStats,
    pub gdp: MetricStats,
}

/// [`MetricStats`] of `field` per calendar quarter (`YYYYQn`), ascending.
///
/// Records without a parseable date or a valid value are dropped; quarters
/// left empty do not appear.
pub fn quarterly_stats<'a, I>(
    records: I,
    date_fields: &[String],
    field: &str,
) -> BTreeMap<String, MetricStats>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for rec in records {
        let Some(quarter) = rec.first_of(date_fields).and_then(quarter_key) else {
            continue;
        };
        if let Some(v) = field_value(rec, field) {
            grouped.entry(quarter).or_default().push(v);
        }
    }
    grouped
        .into_iter()
        .filter_map(|(q, values)| MetricStats::from_values(&values).map(|s| (q, s)))
        .collect()
}

/// Quarterly radiance and GDP side by side, inner-joined on the quarter.
pub fn quarterly_join<'a, I>(
    records: I,
    date_fields: &[String],
    radiance_field: &str,
    gdp_field: &str,
) -> Vec<QuarterlyRow>
where
    I: IntoIterator<Item = &'a Record> + Clone,
{
    let radiance = quarterly_stats(records.clone(), date_fields, radiance_field);
    let mut gdp = quarterly_stats(records, date_fields, gdp_field);
    radiance
        .into_iter()
        .filter_map(|(quarter, radiance)| {
            let gdp = gdp.remove(&quarter)?;
            Some(QuarterlyRow { quarter, radiance, gdp })
        })
        .collect()
}
