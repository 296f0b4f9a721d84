use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{Record, RecordSet};
use crate::config::{FieldNames, YearBounds};
use crate::stats::year::{extract_year, parse_date};

// ---------------------------------------------------------------------------
// Selection: which records the views are computed over
// ---------------------------------------------------------------------------

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Current filter selection.
///
/// An empty `groups` set means "no municipality constraint", matching the
/// API where omitting `municipios` returns every municipality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Allowed group labels, compared trimmed and case-insensitively.
    pub groups: BTreeSet<String>,
    pub year: Option<i32>,
    pub date_range: Option<DateRange>,
}

impl Selection {
    pub fn is_unfiltered(&self) -> bool {
        self.groups.is_empty() && self.year.is_none() && self.date_range.is_none()
    }

    /// Whether `record` passes every active constraint.
    ///
    /// * group allow-list → the record's label must match one entry
    /// * year → the record's extracted year must equal it
    /// * date range → the record's date must parse and fall inside it
    pub fn matches(&self, record: &Record, fields: &FieldNames, years: &YearBounds) -> bool {
        if !self.groups.is_empty() {
            let Some(label) = record.label(&fields.category) else {
                return false;
            };
            let label = label.to_lowercase();
            if !self
                .groups
                .iter()
                .any(|g| g.trim().to_lowercase() == label)
            {
                return false;
            }
        }

        let date = record.first_of(&fields.date);

        if let Some(year) = self.year {
            match date.and_then(|d| extract_year(d, years)) {
                Some(y) if y == year => {}
                _ => return false,
            }
        }

        if let Some(range) = &self.date_range {
            match date.and_then(|d| parse_date(&d.to_string())) {
                Some(day) if range.contains(day) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Return indices of records that pass the selection.
pub fn selected_indices(
    records: &RecordSet,
    selection: &Selection,
    fields: &FieldNames,
    years: &YearBounds,
) -> Vec<usize> {
    if selection.is_unfiltered() {
        return (0..records.len()).collect();
    }
    records
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec, fields, years))
        .map(|(i, _)| i)
        .collect()
}
