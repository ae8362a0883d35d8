//! Snips, shuffled controls and enrichment statistics for average TAD analysis.
//!
//! This crate turns an [`IntervalSet`](avtad_core::models::IntervalSet) and a
//! contact-matrix source into:
//!
//! - shuffled control layouts that keep every chromosome's interval sizes
//!   and gaps but scramble their order ([`shuffle`])
//! - flanked, log2-transformed square snips per interval ([`extract`])
//! - NaN-aware per-interval statistics ([`enrichment`])
//!
//! # Example
//!
//! ```no_run
//! use avtad_core::models::{ChromMatrices, IntervalSet, Variant};
//! use avtad_snip::{generate_layouts, extract_snips};
//!
//! # fn run(set: &IntervalSet, source: &ChromMatrices) -> avtad_snip::errors::Result<()> {
//! let layouts = generate_layouts(set, 2, Some(42))?;
//! for layout in &layouts {
//!     let snips = extract_snips(&set.chroms(), &layout.spans, source, 1.0)?;
//!     println!("{}: {} snips", layout.variant, snips.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod enrichment;
pub mod errors;
pub mod extract;
pub mod shuffle;

use avtad_core::models::{BinSpan, IntervalSet, MatrixSource, Variant};

// re-exports
pub use enrichment::{
    ENRICHMENT_COLUMNS, Enrichment, LocalEnrichment, local_enrichment, summarize, summarize_span, summarize_spans,
};
pub use extract::{extract_snip, extract_snips};
pub use shuffle::{ShuffledIntervalSet, generate_controls, shuffle_interval_set, shuffle_segmentation};

///
/// Row-aligned bin spans of one variant of a run.
///
#[derive(Debug, Clone, PartialEq)]
pub struct VariantLayout {
    pub variant: Variant,
    pub spans: Vec<BinSpan>,
}

///
/// The real layout followed by `niter` shuffled controls.
pub fn generate_layouts(
    set: &IntervalSet,
    niter: usize,
    seed: Option<u64>,
) -> errors::Result<Vec<VariantLayout>> {
    let observed = VariantLayout {
        variant: Variant::Observed,
        spans: set.spans(),
    };
    let controls = generate_controls(set, niter, seed)?
        .into_iter()
        .map(|control| VariantLayout {
            variant: Variant::Shuffled(control.iteration),
            spans: control.spans,
        });

    Ok(std::iter::once(observed).chain(controls).collect())
}

///
/// Per-interval statistics of one variant, row-aligned with the interval set.
///
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSummary {
    pub variant: Variant,
    pub spans: Vec<BinSpan>,
    pub enrichment: Vec<Enrichment>,
}

///
/// Summarize every layout of a run against the same matrix source.
pub fn summarize_variants<S>(
    set: &IntervalSet,
    layouts: &[VariantLayout],
    source: &S,
) -> errors::Result<Vec<VariantSummary>>
where
    S: MatrixSource + ?Sized,
{
    let chroms = set.chroms();
    layouts
        .iter()
        .map(|layout| {
            Ok(VariantSummary {
                variant: layout.variant,
                spans: layout.spans.clone(),
                enrichment: summarize_spans(&chroms, &layout.spans, source)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use avtad_core::models::{ChromMatrices, ContactMatrix};
    use ndarray::Array2;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn set() -> IntervalSet {
        let records = vec![
            ("chr1".to_string(), 5_000, 15_000, vec![]),
            ("chr1".to_string(), 20_000, 40_000, vec![]),
            ("chr1".to_string(), 45_000, 60_000, vec![]),
        ];
        IntervalSet::from_bp(records, vec![], 1_000).unwrap()
    }

    #[rstest]
    fn test_layouts_observed_first(set: IntervalSet) {
        let layouts = generate_layouts(&set, 2, Some(9)).unwrap();
        let variants: Vec<Variant> = layouts.iter().map(|l| l.variant).collect();
        assert_eq!(variants, Variant::all(2));
        assert_eq!(layouts[0].spans, set.spans());
    }

    #[rstest]
    fn test_summarize_variants_rows(set: IntervalSet) {
        let mut source = ChromMatrices::new(1_000);
        source.insert(
            "chr1",
            ContactMatrix::new("chr1", Array2::from_elem((80, 80), 1.0)).unwrap(),
        );

        let layouts = generate_layouts(&set, 1, Some(1)).unwrap();
        let summaries = summarize_variants(&set, &layouts, &source).unwrap();

        assert_eq!(summaries.len(), 2);
        for summary in &summaries {
            let counts: Vec<usize> = summary.enrichment.iter().map(|e| e.finite_count).collect();
            // sizes are preserved, so the blocks have the same number of cells
            assert_eq!(counts, vec![100, 400, 225]);
        }
    }
}
