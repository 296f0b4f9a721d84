use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::coerce::field_value;
use super::sample::stride_sample;
use crate::data::model::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub group: String,
}

/// Pair `x_field` with `y_field` per record and group the pairs by category.
///
/// The two metrics are expected to already sit on the same record (the API's
/// combined endpoint joins them). Both must be valid for a record to count.
/// Each group keeps its source order and is stride-sampled down to at most
/// `max_points` points.
pub fn scatter_by_group<'a, I>(
    records: I,
    category: &[String],
    x_field: &str,
    y_field: &str,
    max_points: usize,
) -> BTreeMap<String, Vec<ScatterPoint>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut grouped: BTreeMap<String, Vec<ScatterPoint>> = BTreeMap::new();
    for rec in records {
        let (Some(x), Some(y)) = (field_value(rec, x_field), field_value(rec, y_field)) else {
            continue;
        };
        let Some(group) = rec.label(category).filter(|g| !g.is_empty()) else {
            continue;
        };
        grouped
            .entry(group.clone())
            .or_default()
            .push(ScatterPoint { x, y, group });
    }

    grouped
        .into_iter()
        .map(|(group, points)| (group, stride_sample(points, max_points)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::FieldValue;

    fn category() -> Vec<String> {
        vec!["municipio".to_string(), "Municipio".to_string()]
    }

    fn rec(group: &str, pib: FieldValue, rad: FieldValue) -> Record {
        Record::from_iter([
            ("municipio", FieldValue::Text(group.to_string())),
            ("pib_mun", pib),
            ("Media_de_radianza", rad),
        ])
    }

    #[test]
    fn requires_both_metrics_valid() {
        let records = vec![
            rec("Toluca", FieldValue::Float(10.0), FieldValue::Float(2.0)),
            rec("Toluca", FieldValue::Float(0.0), FieldValue::Float(2.0)),
            rec("Toluca", FieldValue::Float(10.0), FieldValue::Null),
            rec("Lerma ", FieldValue::Text("7".into()), FieldValue::Float(1.0)),
            rec("", FieldValue::Float(1.0), FieldValue::Float(1.0)),
        ];
        let out = scatter_by_group(&records, &category(), "pib_mun", "Media_de_radianza", 500);
        assert_eq!(out.len(), 2);
        assert_eq!(out["Toluca"], vec![ScatterPoint { x: 10.0, y: 2.0, group: "Toluca".into() }]);
        assert_eq!(out["Lerma"][0].x, 7.0);
    }

    #[test]
    fn large_groups_are_strided_in_order() {
        let g = 1234;
        let mut records: Vec<Record> = (1..=g)
            .map(|i| rec("Toluca", FieldValue::Integer(i), FieldValue::Float(1.0)))
            .collect();
        records.push(rec("Lerma", FieldValue::Float(1.0), FieldValue::Float(1.0)));

        let out = scatter_by_group(&records, &category(), "pib_mun", "Media_de_radianza", 500);
        let toluca = &out["Toluca"];
        let step = (g as usize).div_ceil(500);
        assert_eq!(toluca.len(), (g as usize).div_ceil(step));
        assert_eq!(toluca[0].x, 1.0);
        assert_eq!(toluca[1].x, 1.0 + step as f64);
        assert!(toluca.windows(2).all(|w| w[0].x < w[1].x));
        assert_eq!(out["Lerma"].len(), 1);
    }

    #[test]
    fn no_valid_pairs_gives_empty_map() {
        let records = vec![rec("A", FieldValue::Null, FieldValue::Null)];
        assert!(scatter_by_group(&records, &category(), "pib_mun", "Media_de_radianza", 500).is_empty());
    }
}
