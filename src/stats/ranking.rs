use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::coerce::field_value;
use crate::data::model::Record;

/// Mean of one metric for a group, as listed in the comparison ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRank {
    pub group: String,
    pub mean: f64,
    pub count: usize,
}

/// Groups ordered by descending mean of `field`, truncated to `top`.
/// Ties keep name order.
pub fn rank_groups<'a, I>(records: I, category: &[String], field: &str, top: usize) -> Vec<GroupRank>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for rec in records {
        let Some(group) = rec.label(category).filter(|g| !g.is_empty()) else {
            continue;
        };
        if let Some(v) = field_value(rec, field) {
            let entry = totals.entry(group).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
    }

    let mut ranks: Vec<GroupRank> = totals
        .into_iter()
        .map(|(group, (sum, count))| GroupRank {
            group,
            mean: sum / count as f64,
            count,
        })
        .collect();
    ranks.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    ranks.truncate(top);
    ranks
}
