use lazy_static::lazy_static;
use regex::Regex;

use crate::data::model::{FieldValue, Record};

lazy_static! {
    static ref NUMERIC_PREFIX: Regex =
        Regex::new(r"^[+-]?(?:Infinity|(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)")
            .expect("static regex");
}

// ---------------------------------------------------------------------------
// Numeric coercion
// ---------------------------------------------------------------------------

/// Parse a field value as a float, the way the API's consumers always have:
/// numbers pass through, text is read by its leading numeric prefix
/// (`"12.5 nW"` → 12.5), everything else is not a number.
pub fn parse_number(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Float(v) => Some(*v),
        FieldValue::Integer(i) => Some(*i as f64),
        FieldValue::Text(s) => parse_leading_float(s),
        FieldValue::Bool(_) | FieldValue::Null => None,
    }
}

/// A value usable by every statistic: finite and strictly positive.
///
/// Zero and negative readings are missing-value sentinels in the source
/// data, not measurements.
pub fn positive_value(value: &FieldValue) -> Option<f64> {
    parse_number(value).filter(|v| v.is_finite() && *v > 0.0)
}

/// The valid value of `field` in `record`, if any.
pub fn field_value(record: &Record, field: &str) -> Option<f64> {
    record.get(field).and_then(positive_value)
}

/// Extract `field` from every record, dropping records whose value is
/// missing, non-numeric, non-finite or `<= 0`.
pub fn numeric_series<'a, I>(records: I, field: &str) -> Vec<f64>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter_map(|r| field_value(r, field))
        .collect()
}

/// Longest prefix of `s` (after leading whitespace) that reads as a decimal
/// float: optional sign, digits with an optional fraction, optional exponent.
fn parse_leading_float(s: &str) -> Option<f64> {
    let m = NUMERIC_PREFIX.find(s.trim_start())?;
    m.as_str().parse::<f64>().ok()
}
