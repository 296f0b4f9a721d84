use serde::{Deserialize, Serialize};

use super::sample::stride_sample;

/// One equal-width histogram bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    /// `"{lo} - {hi}"` with both bounds rounded to integers.
    pub range_label: String,
    pub count: usize,
    pub mid: f64,
}

/// Equal-width histogram of `values` with `bins` slices spanning
/// `[min, max]`.
///
/// Inputs longer than `sample_cap` are stride-sampled first and the bin
/// edges come from the sample, so counts sum to the sample size rather than
/// the population size. A constant series gets a unit bin width and lands
/// entirely in the first bin.
pub fn histogram(values: &[f64], bins: usize, sample_cap: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let sampled = stride_sample(values.to_vec(), sample_cap);

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in &sampled {
        min = min.min(v);
        max = max.max(v);
    }

    let mut width = (max - min) / bins as f64;
    if width <= 0.0 || !width.is_finite() {
        width = 1.0;
    }

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| {
            let lo = min + i as f64 * width;
            let hi = min + (i + 1) as f64 * width;
            HistogramBin {
                range_label: format!("{} - {}", round_label(lo), round_label(hi)),
                count: 0,
                mid: min + (i as f64 + 0.5) * width,
            }
        })
        .collect();

    for &v in &sampled {
        let idx = ((v - min) / width).floor() as usize;
        out[idx.min(bins - 1)].count += 1;
    }
    out
}

/// Integer rendering with halves rounded away from zero.
fn round_label(x: f64) -> String {
    let r = x.round();
    // avoid "-0"
    let r = if r == 0.0 { 0.0 } else { r };
    format!("{r:.0}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_bins_cover_range() {
        let values: Vec<f64> = (0..=100).map(|v| v as f64).collect();
        let h = histogram(&values, 20, 2000);
        assert_eq!(h.len(), 20);
        assert_eq!(h[0].range_label, "0 - 5");
        assert_eq!(h[19].range_label, "95 - 100");
        assert_eq!(h[0].mid, 2.5);
        assert_eq!(h.iter().map(|b| b.count).sum::<usize>(), 101);
        // the maximum sits on the last edge and is clamped into bin 19
        assert_eq!(h[19].count, 6);
    }

    #[test]
    fn labels_round_halves_up() {
        let h = histogram(&[0.5, 10.5], 2, 2000);
        assert_eq!(h[0].range_label, "1 - 6");
        assert_eq!(h[1].range_label, "6 - 11");
    }

    #[test]
    fn constant_series_lands_in_first_bin() {
        let h = histogram(&[3.0, 3.0, 3.0], 20, 2000);
        assert_eq!(h[0].count, 3);
        assert!(h[1..].iter().all(|b| b.count == 0));
        assert_eq!(h[0].range_label, "3 - 4");
    }

    #[test]
    fn large_inputs_are_sampled_before_binning() {
        // Only even indices survive a stride of 2; the odd ones hold an
        // extreme value that must not stretch the bin edges.
        let values: Vec<f64> = (0..4000)
            .map(|i| if i % 2 == 0 { 1.0 + (i % 100) as f64 } else { 1e9 })
            .collect();
        let h = histogram(&values, 20, 2000);
        assert_eq!(h.iter().map(|b| b.count).sum::<usize>(), 2000);
        assert_eq!(h[19].range_label, "94 - 99");
    }

    #[test]
    fn empty_series_has_no_bins() {
        assert!(histogram(&[], 20, 2000).is_empty());
    }

    #[test]
    fn serializes_contract_field_names() {
        let h = histogram(&[1.0, 2.0], 1, 2000);
        let json = serde_json::to_value(&h[0]).unwrap();
        assert_eq!(json["rangeLabel"], "1 - 2");
        assert_eq!(json["count"], 2);
    }
}
