//! Shuffled control segmentations.
//!
//! A control keeps the multiset of interval sizes and the multiset of gaps
//! between consecutive intervals of every chromosome, but draws their order
//! at random. Interval sizes therefore stay identical while positions lose
//! any relation to the contact map.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use avtad_core::models::{BinSpan, IntervalSet};

use crate::errors::{Result, SnipError};

///
/// Shuffled spans of one chromosome.
///
/// `order[j]` is the source row whose size was placed at shuffled row `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShuffledSegmentation {
    pub spans: Vec<BinSpan>,
    pub order: Vec<usize>,
}

impl ShuffledSegmentation {
    ///
    /// Shuffled spans re-sorted by `order`, so that row `i` of the result
    /// has the size of source row `i`.
    pub fn realigned(&self) -> Vec<BinSpan> {
        let mut aligned = vec![BinSpan::new(0, 0); self.spans.len()];
        for (span, &source_row) in self.spans.iter().zip(&self.order) {
            aligned[source_row] = *span;
        }
        aligned
    }

    /// Check the size-preservation invariant against the source spans.
    pub fn preserves_sizes(&self, source: &[BinSpan]) -> bool {
        self.spans.len() == source.len()
            && self
                .realigned()
                .iter()
                .zip(source)
                .all(|(shuffled, original)| shuffled.size() == original.size())
    }
}

///
/// Shuffle the intervals of one chromosome.
///
/// Sizes `end_i - start_i` and gaps (`start_0`, then `start_i - end_{i-1}`)
/// are permuted independently and positions are rebuilt by cumulative sum.
/// Spans are expected sorted by start, as an [IntervalSet] keeps them.
///
/// # Arguments
/// - spans: the chromosome's intervals in row order
/// - rng: random source; sizes are permuted first, then gaps
pub fn shuffle_segmentation<R: Rng + ?Sized>(spans: &[BinSpan], rng: &mut R) -> ShuffledSegmentation {
    let n = spans.len();
    if n <= 1 {
        return ShuffledSegmentation {
            spans: spans.to_vec(),
            order: (0..n).collect(),
        };
    }

    let sizes: Vec<i64> = spans.iter().map(|s| s.size()).collect();
    let mut gaps: Vec<i64> = Vec::with_capacity(n);
    gaps.push(spans[0].start);
    gaps.extend(spans.windows(2).map(|w| w[1].start - w[0].end));

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);
    gaps.shuffle(rng);

    let mut end = 0i64;
    let shuffled = order
        .iter()
        .zip(&gaps)
        .map(|(&source_row, &gap)| {
            let size = sizes[source_row];
            end += gap + size;
            BinSpan::new(end - size, end)
        })
        .collect();

    ShuffledSegmentation {
        spans: shuffled,
        order,
    }
}

///
/// Mix a run-level seed with an iteration index (splitmix64), so parallel
/// iterations draw independent but reproducible streams.
pub fn derive_seed(run_seed: u64, iteration: usize) -> u64 {
    let mut z = run_seed.wrapping_add((iteration as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seeded generator, or one seeded from OS entropy.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

///
/// One shuffled control of a whole [IntervalSet], aligned to its rows.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ShuffledIntervalSet {
    pub iteration: usize,
    pub spans: Vec<BinSpan>,
}

///
/// Shuffle every chromosome of `set` independently.
///
/// The returned spans are row-aligned with `set`: row `i` keeps the size of
/// interval `i` but sits at a shuffled position on the same chromosome.
pub fn shuffle_interval_set<R: Rng + ?Sized>(set: &IntervalSet, rng: &mut R) -> Result<Vec<BinSpan>> {
    let mut aligned = set.spans();

    let chroms: Vec<String> = set.iter_chroms().map(String::from).collect();
    for chrom in chroms {
        let rows = set.chrom_indices(&chrom);
        let source: Vec<BinSpan> = rows.iter().map(|&i| aligned[i]).collect();

        let shuffled = shuffle_segmentation(&source, rng);
        if !shuffled.preserves_sizes(&source) {
            return Err(SnipError::SizeInvariant { chrom });
        }

        for (row, span) in rows.iter().zip(shuffled.realigned()) {
            aligned[*row] = span;
        }
    }

    Ok(aligned)
}

///
/// Draw `niter` independent controls of `set` in parallel.
///
/// Iteration `k` uses `derive_seed(seed, k)` when a run seed is given, so the
/// result does not depend on thread scheduling. Zero iterations is a valid
/// no-op.
pub fn generate_controls(
    set: &IntervalSet,
    niter: usize,
    seed: Option<u64>,
) -> Result<Vec<ShuffledIntervalSet>> {
    debug!("Drawing {} shuffled controls (seed: {:?})", niter, seed);
    (0..niter)
        .into_par_iter()
        .map(|iteration| {
            let mut rng = make_rng(seed.map(|s| derive_seed(s, iteration)));
            let spans = shuffle_interval_set(set, &mut rng)?;
            Ok(ShuffledIntervalSet { iteration, spans })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    /// Sizes {10, 20, 15} separated by gaps of 5 bins.
    #[fixture]
    fn spans() -> Vec<BinSpan> {
        vec![
            BinSpan::new(5, 15),
            BinSpan::new(20, 40),
            BinSpan::new(45, 60),
        ]
    }

    #[fixture]
    fn interval_set() -> IntervalSet {
        let records = (0..10u64)
            .map(|i| ("chr2L".to_string(), i * 50_000 + 1_000, i * 50_000 + 11_000 + i * 2_000, vec![]))
            .chain((0..4u64).map(|i| ("chr3R".to_string(), i * 20_000, (i + 1) * 20_000, vec![])))
            .collect::<Vec<_>>();
        IntervalSet::from_bp(records, vec![], 1_000).unwrap()
    }

    #[rstest]
    fn test_realigned_sizes_match_source(spans: Vec<BinSpan>) {
        let mut rng = make_rng(Some(42));
        let shuffled = shuffle_segmentation(&spans, &mut rng);

        let sizes: Vec<i64> = shuffled.realigned().iter().map(|s| s.size()).collect();
        assert_eq!(sizes, vec![10, 20, 15]);
        assert!(shuffled.preserves_sizes(&spans));
    }

    #[rstest]
    fn test_order_maps_shuffled_rows_to_source_rows(spans: Vec<BinSpan>) {
        let mut rng = make_rng(Some(7));
        let shuffled = shuffle_segmentation(&spans, &mut rng);

        let mut order = shuffled.order.clone();
        order.sort();
        assert_eq!(order, vec![0, 1, 2]);
        for (span, &row) in shuffled.spans.iter().zip(&shuffled.order) {
            assert_eq!(span.size(), spans[row].size());
        }
    }

    #[rstest]
    fn test_total_extent_is_preserved(spans: Vec<BinSpan>) {
        for seed in 0..20 {
            let mut rng = make_rng(Some(seed));
            let shuffled = shuffle_segmentation(&spans, &mut rng);

            // gaps and sizes only move, so the last interval always ends at the same bin
            let last_end = shuffled.spans.iter().map(|s| s.end).max().unwrap();
            assert_eq!(last_end, 60);

            let mut gaps: Vec<i64> = std::iter::once(shuffled.spans[0].start)
                .chain(shuffled.spans.windows(2).map(|w| w[1].start - w[0].end))
                .collect();
            gaps.sort();
            assert_eq!(gaps, vec![5, 5, 5]);
        }
    }

    #[rstest]
    fn test_single_interval_returns_itself() {
        let spans = vec![BinSpan::new(3, 9)];
        let mut rng = make_rng(Some(1));
        let shuffled = shuffle_segmentation(&spans, &mut rng);
        assert_eq!(shuffled.spans, spans);
        assert_eq!(shuffled.order, vec![0]);
    }

    #[rstest]
    fn test_empty_chromosome() {
        let mut rng = make_rng(Some(1));
        let shuffled = shuffle_segmentation(&[], &mut rng);
        assert!(shuffled.spans.is_empty());
        assert!(shuffled.order.is_empty());
    }

    #[rstest]
    fn test_same_seed_same_draw(spans: Vec<BinSpan>) {
        let a = shuffle_segmentation(&spans, &mut make_rng(Some(11)));
        let b = shuffle_segmentation(&spans, &mut make_rng(Some(11)));
        assert_eq!(a, b);
    }

    #[rstest]
    fn test_shuffle_interval_set_keeps_rows_on_their_chromosome(interval_set: IntervalSet) {
        let mut rng = make_rng(Some(3));
        let aligned = shuffle_interval_set(&interval_set, &mut rng).unwrap();

        assert_eq!(aligned.len(), interval_set.len());
        for (iv, span) in interval_set.iter().zip(&aligned) {
            assert_eq!(iv.size(), span.size());
        }

        // chr3R is tiled end to end with equal sizes, so its layout cannot change
        for row in interval_set.chrom_indices("chr3R") {
            assert_eq!(aligned[row], interval_set.intervals[row].span());
        }
    }

    #[rstest]
    fn test_generate_controls_is_reproducible(interval_set: IntervalSet) {
        let a = generate_controls(&interval_set, 4, Some(2024)).unwrap();
        let b = generate_controls(&interval_set, 4, Some(2024)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.iter().map(|c| c.iteration).collect::<Vec<_>>(), vec![0, 1, 2, 3]);

        // independent sub-seeds: iterations should not all coincide
        assert!(a.windows(2).any(|w| w[0].spans != w[1].spans));
    }

    #[rstest]
    fn test_zero_iterations(interval_set: IntervalSet) {
        assert!(generate_controls(&interval_set, 0, None).unwrap().is_empty());
    }

    #[rstest]
    fn test_derive_seed_differs_per_iteration() {
        assert_ne!(derive_seed(1, 0), derive_seed(1, 1));
        assert_eq!(derive_seed(1, 5), derive_seed(1, 5));
    }
}
