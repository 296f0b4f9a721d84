use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::color::ColorMap;
use crate::config::EngineConfig;
use crate::data::filter::{selected_indices, DateRange, Selection};
use crate::data::model::{Record, RecordSet};
use crate::stats::{self, BoxSummary, GroupRank, HistogramBin, ScatterPoint, SeriesSummary};
use crate::stats::{QuarterlyRow, StatsOverview, TimeSeriesPoint, YearGroupTable};

// ---------------------------------------------------------------------------
// Memo – last-value cache
// ---------------------------------------------------------------------------

/// Single-slot cache: holds the last computed value together with the key it
/// was computed for, and recomputes only when asked for a different key.
#[derive(Debug, Clone)]
pub struct Memo<K, V> {
    slot: Option<(K, V)>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<K: PartialEq + std::fmt::Debug, V> Memo<K, V> {
    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> &V {
        let entry = match self.slot.take() {
            Some((k, v)) if k == key => {
                log::trace!("memo hit for {k:?}");
                (k, v)
            }
            _ => {
                log::trace!("memo miss for {key:?}");
                let v = compute();
                (key, v)
            }
        };
        &self.slot.insert(entry).1
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}

/// What a view's value depends on besides its own parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Inputs {
    /// Bumped whenever the record set is replaced.
    generation: u64,
    /// Bumped whenever the selection changes.
    revision: u64,
}

#[derive(Default)]
struct Views {
    boxes: Memo<(u64, String), Vec<BoxSummary>>,
    summary: Memo<(Inputs, String), Option<SeriesSummary>>,
    histogram: Memo<(Inputs, String), Vec<HistogramBin>>,
    daily: Memo<(Inputs, String), Vec<TimeSeriesPoint>>,
    yearly: Memo<(Inputs, String), YearGroupTable>,
    scatter: Memo<(Inputs, String, String), BTreeMap<String, Vec<ScatterPoint>>>,
    ranking: Memo<(Inputs, String, usize), Vec<GroupRank>>,
    overview: Memo<Inputs, StatsOverview>,
    quarterly: Memo<(Inputs, String, String), Vec<QuarterlyRow>>,
}

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// The dashboard's data state, independent of rendering: the loaded records,
/// the current selection and memoized views over them.
pub struct DashboardState {
    pub config: EngineConfig,

    records: RecordSet,
    selection: Selection,

    /// Indices of records passing the current selection (cached).
    visible_indices: Vec<usize>,

    generation: u64,
    revision: u64,
    views: Views,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl DashboardState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            records: RecordSet::default(),
            selection: Selection::default(),
            visible_indices: Vec::new(),
            generation: 0,
            revision: 0,
            views: Views::default(),
        }
    }

    /// Ingest a newly loaded record set, keeping the current selection.
    pub fn set_records(&mut self, records: RecordSet) {
        self.records = records;
        self.generation += 1;
        self.refilter();
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn visible_indices(&self) -> &[usize] {
        &self.visible_indices
    }

    /// Records passing the current selection, in source order.
    pub fn visible_records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.visible_indices.iter().map(|&i| &self.records.records[i])
    }

    /// Recompute `visible_indices` after a selection or data change.
    pub fn refilter(&mut self) {
        self.visible_indices = selected_indices(
            &self.records,
            &self.selection,
            &self.config.fields,
            &self.config.years,
        );
        log::debug!(
            "{} of {} records selected",
            self.visible_indices.len(),
            self.records.len()
        );
    }

    fn selection_changed(&mut self) {
        self.revision += 1;
        self.refilter();
    }

    // -- selection mutators --

    pub fn set_selection(&mut self, selection: Selection) {
        if selection != self.selection {
            self.selection = selection;
            self.selection_changed();
        }
    }

    /// Toggle a single group in the allow-list.
    pub fn toggle_group(&mut self, group: &str) {
        let group = group.trim().to_string();
        if !self.selection.groups.remove(&group) {
            self.selection.groups.insert(group);
        }
        self.selection_changed();
    }

    /// Allow every group present in the data.
    pub fn select_all_groups(&mut self) {
        self.selection.groups = self.records.groups(&self.config.fields.category);
        self.selection_changed();
    }

    /// Clear the allow-list, which removes the group constraint.
    pub fn select_no_groups(&mut self) {
        self.selection.groups.clear();
        self.selection_changed();
    }

    pub fn set_year(&mut self, year: Option<i32>) {
        if self.selection.year != year {
            self.selection.year = year;
            self.selection_changed();
        }
    }

    pub fn set_date_range(&mut self, from: NaiveDate, to: NaiveDate) {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };
        self.selection.date_range = Some(DateRange { from, to });
        self.selection_changed();
    }

    pub fn clear_date_range(&mut self) {
        if self.selection.date_range.take().is_some() {
            self.selection_changed();
        }
    }

    // -- views --

    fn inputs(&self) -> Inputs {
        Inputs {
            generation: self.generation,
            revision: self.revision,
        }
    }

    /// Legend colours for the groups in the current selection.
    pub fn color_map(&self) -> ColorMap {
        let category = &self.config.fields.category;
        let groups: BTreeSet<String> = self
            .visible_records()
            .filter_map(|r| r.label(category))
            .filter(|g| !g.is_empty())
            .collect();
        ColorMap::new(groups)
    }

    /// Box plots per group over the whole record set; the selection does not
    /// apply, so the panel always compares every municipality.
    pub fn box_summaries(&mut self, field: &str) -> &[BoxSummary] {
        let key = (self.generation, field.to_string());
        let records = &self.records.records;
        let category = &self.config.fields.category;
        self.views
            .boxes
            .get_or_compute(key, || stats::box_summaries(records, category, field))
    }

    pub fn series_summary(&mut self, field: &str) -> Option<&SeriesSummary> {
        let key = (self.inputs(), field.to_string());
        let (records, visible) = (&self.records.records, &self.visible_indices);
        self.views
            .summary
            .get_or_compute(key, || {
                let values = stats::numeric_series(visible.iter().map(|&i| &records[i]), field);
                stats::series_summary(&values)
            })
            .as_ref()
    }

    pub fn histogram(&mut self, field: &str) -> &[HistogramBin] {
        let key = (self.inputs(), field.to_string());
        let (records, visible) = (&self.records.records, &self.visible_indices);
        let cfg = &self.config.histogram;
        self.views.histogram.get_or_compute(key, || {
            let values = stats::numeric_series(visible.iter().map(|&i| &records[i]), field);
            stats::histogram(&values, cfg.bins, cfg.sample_cap)
        })
    }

    pub fn daily_series(&mut self, field: &str) -> &[TimeSeriesPoint] {
        let key = (self.inputs(), field.to_string());
        let (records, visible) = (&self.records.records, &self.visible_indices);
        let dates = &self.config.fields.date;
        self.views.daily.get_or_compute(key, || {
            stats::daily_means(visible.iter().map(|&i| &records[i]), dates, field)
        })
    }

    pub fn year_group_sums(&mut self, field: &str) -> &YearGroupTable {
        let key = (self.inputs(), field.to_string());
        let (records, visible) = (&self.records.records, &self.visible_indices);
        let fields = &self.config.fields;
        let years = &self.config.years;
        self.views.yearly.get_or_compute(key, || {
            stats::year_group_sums(
                visible.iter().map(|&i| &records[i]),
                &fields.date,
                &fields.category,
                field,
                years,
            )
        })
    }

    pub fn scatter(&mut self, x_field: &str, y_field: &str) -> &BTreeMap<String, Vec<ScatterPoint>> {
        let key = (self.inputs(), x_field.to_string(), y_field.to_string());
        let (records, visible) = (&self.records.records, &self.visible_indices);
        let category = &self.config.fields.category;
        let cap = self.config.scatter.max_points_per_group;
        self.views.scatter.get_or_compute(key, || {
            stats::scatter_by_group(visible.iter().map(|&i| &records[i]), category, x_field, y_field, cap)
        })
    }

    pub fn ranking(&mut self, field: &str, top: usize) -> &[GroupRank] {
        let key = (self.inputs(), field.to_string(), top);
        let (records, visible) = (&self.records.records, &self.visible_indices);
        let category = &self.config.fields.category;
        self.views.ranking.get_or_compute(key, || {
            stats::rank_groups(visible.iter().map(|&i| &records[i]), category, field, top)
        })
    }

    /// Record overview and per-group radiance figures over the selection.
    pub fn group_stats(&mut self) -> &StatsOverview {
        let key = self.inputs();
        let (records, visible) = (&self.records.records, &self.visible_indices);
        let fields = &self.config.fields;
        self.views.overview.get_or_compute(key, || {
            stats::group_stats(
                visible.iter().map(|&i| &records[i]),
                &fields.date,
                &fields.category,
                &fields.radiance,
                &fields.radiance_sum,
            )
        })
    }

    pub fn quarterly(&mut self, radiance_field: &str, gdp_field: &str) -> &[QuarterlyRow] {
        let key = (self.inputs(), radiance_field.to_string(), gdp_field.to_string());
        let (records, visible) = (&self.records.records, &self.visible_indices);
        let dates = &self.config.fields.date;
        self.views.quarterly.get_or_compute(key, || {
            stats::quarterly_join(
                visible.iter().map(|&i| &records[i]),
                dates,
                radiance_field,
                gdp_field,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::FieldValue;

    fn sample_state() -> DashboardState {
        let rec = |m: &str, fecha: &str, v: f64| {
            Record::from_iter([
                ("Municipio", FieldValue::Text(m.to_string())),
                ("Fecha", FieldValue::Text(fecha.to_string())),
                ("Media_de_radianza", FieldValue::Float(v)),
            ])
        };
        let mut state = DashboardState::default();
        state.set_records(RecordSet::from_records(vec![
            rec("Toluca", "2020-01-01", 4.0),
            rec("Toluca", "2021-01-01", 6.0),
            rec("Lerma", "2021-01-01", 1.0),
        ]));
        state
    }

    #[test]
    fn memo_recomputes_only_on_new_key() {
        let mut memo: Memo<u32, u32> = Memo::default();
        let mut calls = 0;
        assert_eq!(*memo.get_or_compute(1, || { calls += 1; 10 }), 10);
        assert_eq!(*memo.get_or_compute(1, || { calls += 1; 20 }), 10);
        assert_eq!(*memo.get_or_compute(2, || { calls += 1; 30 }), 30);
        assert_eq!(calls, 2);
        memo.clear();
        assert_eq!(*memo.get_or_compute(2, || 40), 40);
    }

    #[test]
    fn selection_drives_views() {
        let mut state = sample_state();
        assert_eq!(state.visible_indices(), &[0, 1, 2]);
        assert_eq!(state.series_summary("Media_de_radianza").map(|s| s.count), Some(3));

        state.toggle_group("lerma");
        assert_eq!(state.visible_indices(), &[2]);
        assert_eq!(state.series_summary("Media_de_radianza").map(|s| s.count), Some(1));

        state.select_no_groups();
        state.set_year(Some(2021));
        assert_eq!(state.visible_indices(), &[1, 2]);
        let daily = state.daily_series("Media_de_radianza");
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].value, 3.5);
    }

    #[test]
    fn box_plots_ignore_the_selection() {
        let mut state = sample_state();
        state.toggle_group("Toluca");
        let boxes = state.box_summaries("Media_de_radianza");
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].group, "Toluca");
    }

    #[test]
    fn new_records_invalidate_cached_views() {
        let mut state = sample_state();
        assert_eq!(state.ranking("Media_de_radianza", 10).len(), 2);

        state.set_records(RecordSet::default());
        assert!(state.ranking("Media_de_radianza", 10).is_empty());
        assert!(state.box_summaries("Media_de_radianza").is_empty());
        assert!(state.series_summary("Media_de_radianza").is_none());
    }

    #[test]
    fn select_all_lists_every_group() {
        let mut state = sample_state();
        state.select_all_groups();
        assert_eq!(state.selection().groups.len(), 2);
        assert_eq!(state.visible_indices().len(), 3);
        assert_eq!(state.color_map().legend_entries().len(), 2);
    }

    #[test]
    fn date_range_bounds_are_normalised() {
        let mut state = sample_state();
        let d = |y| NaiveDate::from_ymd_opt(y, 1, 1).unwrap();
        state.set_date_range(d(2021), d(2020));
        assert_eq!(state.visible_indices().len(), 3);
        state.set_date_range(d(2021), d(2021));
        assert_eq!(state.visible_indices(), &[1, 2]);
        state.clear_date_range();
        assert!(state.selection().is_unfiltered());
    }

    #[test]
    fn overview_and_quarters_follow_the_selection() {
        let mut state = sample_state();
        assert_eq!(state.group_stats().total_groups, 2);

        state.toggle_group("Toluca");
        let overview = state.group_stats();
        assert_eq!(overview.total_records, 2);
        assert_eq!(overview.groups[0].mean, Some(5.0));

        let quarters = state.quarterly("Media_de_radianza", "Media_de_radianza");
        let keys: Vec<&str> = quarters.iter().map(|r| r.quarter.as_str()).collect();
        assert_eq!(keys, vec!["2020Q1", "2021Q1"]);
    }
}
