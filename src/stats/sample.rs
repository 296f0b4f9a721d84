/// Stride that brings `len` items down to at most `cap`: `ceil(len / cap)`,
/// or 1 when no reduction is needed.
pub fn stride_for(len: usize, cap: usize) -> usize {
    if cap == 0 || len <= cap {
        1
    } else {
        len.div_ceil(cap)
    }
}

/// Deterministic systematic sample: keep every `stride_for(len, cap)`-th
/// item, starting with the first, in source order.
///
/// This is not an unbiased sampler. Results computed from it are
/// representative of the input, not exact population figures.
pub fn stride_sample<T>(items: Vec<T>, cap: usize) -> Vec<T> {
    let step = stride_for(items.len(), cap);
    if step == 1 {
        return items;
    }
    items.into_iter().step_by(step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_inputs_are_untouched() {
        let items: Vec<u32> = (0..2000).collect();
        assert_eq!(stride_sample(items.clone(), 2000), items);
        assert_eq!(stride_for(0, 500), 1);
    }

    #[test]
    fn keeps_multiples_of_the_stride() {
        let items: Vec<u32> = (0..2001).collect();
        let sampled = stride_sample(items, 2000);
        assert_eq!(sampled.len(), 1001);
        assert_eq!(&sampled[..3], &[0, 2, 4]);
        assert_eq!(sampled.last(), Some(&2000));
    }

    #[test]
    fn sample_size_matches_ceiling_formula() {
        for g in [501usize, 999, 1000, 1001, 1499, 12_345] {
            let step = g.div_ceil(500);
            let sampled = stride_sample((0..g).collect::<Vec<_>>(), 500);
            assert_eq!(sampled.len(), g.div_ceil(step), "g = {g}");
            assert!(sampled.len() <= 500);
            assert!(sampled.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
