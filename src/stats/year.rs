//! Year extraction from heterogeneous date values.
//!
//! Dates arrive as ISO strings, `YYYY-MM-DD`, locale formats or already
//! formatted labels. A regex grab of the first four-digit run handles the
//! common case; full date parsing recovers the rest, including epoch
//! timestamps as written by `DataFrame.to_json`.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

use crate::config::YearBounds;
use crate::data::model::FieldValue;

lazy_static! {
    static ref FOUR_DIGITS: Regex = Regex::new(r"\d{4}").expect("static regex");
    /// A date token followed by a `HH:MM` time after `T` or a space.
    static ref DAY_BEFORE_TIME: Regex =
        Regex::new(r"^(\S+?)[T ]\d{1,2}:\d{2}").expect("static regex");
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Parse a date in any of the accepted layouts. Month-first wins over
/// day-first when both would succeed (`03/04/2021` is March 4th).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(dt) = parse_epoch(text) {
        return Some(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.date_naive());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
    {
        return Some(dt.date());
    }
    if let Some(d) = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
    {
        return Some(d);
    }
    // month/year only
    NaiveDate::parse_from_str(&format!("01/{text}"), "%d/%m/%Y").ok()
}

/// Unix timestamp given as a bare run of digits: 10 digits are seconds,
/// 13 are milliseconds. Read as UTC.
fn parse_epoch(text: &str) -> Option<NaiveDateTime> {
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: i64 = text.parse().ok()?;
    let dt = match text.len() {
        10 => DateTime::from_timestamp(n, 0)?,
        13 => DateTime::from_timestamp_millis(n)?,
        _ => return None,
    };
    Some(dt.naive_utc())
}

/// Calendar year of a date-like value, if it falls within `bounds`.
///
/// 1. The first run of four digits in the stringified value.
/// 2. If that is missing or out of bounds, the year of the fully parsed date.
/// 3. Anything still outside `bounds` yields `None`; no sentinel year is
///    ever produced.
pub fn extract_year(value: &FieldValue, bounds: &YearBounds) -> Option<i32> {
    if value.is_blank() {
        return None;
    }
    let text = value.to_string();

    let matched = FOUR_DIGITS
        .find(&text)
        .and_then(|m| m.as_str().parse::<i32>().ok());
    if let Some(year) = matched.filter(|y| bounds.contains(*y)) {
        return Some(year);
    }

    parse_date(&text)
        .map(|d| d.year())
        .filter(|y| bounds.contains(*y))
}

/// Day key of a date value: the text before a trailing time component.
///
/// The text is cut only where a `HH:MM` time follows `T` or a space, so
/// locale dates such as `"1 Jan 2022"` keep their whole text. Epoch
/// timestamps become `YYYY-MM-DD`.
///
/// Keys sort correctly only when every record uses `YYYY-MM-DD`.
pub fn date_key(value: &FieldValue) -> Option<String> {
    if value.is_blank() {
        return None;
    }
    let text = value.to_string();
    let text = text.trim();
    if let Some(dt) = parse_epoch(text) {
        return Some(dt.format("%Y-%m-%d").to_string());
    }
    let day = DAY_BEFORE_TIME
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str());
    Some(day.to_string())
}

/// Calendar quarter of a date value, `YYYYQn`, from the fully parsed date.
pub fn quarter_key(value: &FieldValue) -> Option<String> {
    if value.is_blank() {
        return None;
    }
    let date = parse_date(&value.to_string())?;
    Some(format!("{}Q{}", date.year(), date.month0() / 3 + 1))
}
