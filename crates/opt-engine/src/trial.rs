//! One search trial: build a Hilbert view for a candidate permutation and
//! score it.

use std::sync::Arc;

use curve_core::{HilbertIndex, PointSet, Result};

use crate::metric::FragmentationMetric;
use crate::permutation::Permutation;
use crate::record::SearchRecord;

/// Evaluate one candidate. Trials never fail partially: the first error from
/// index construction or the metric aborts the trial and surfaces to the
/// search loop, which absorbs it as a non-improvement.
pub(crate) fn run_trial<M: FragmentationMetric>(
    points: &Arc<PointSet>,
    candidate: Permutation,
    metric: &M,
    sequence: u64,
) -> Result<SearchRecord> {
    let index = HilbertIndex::build(Arc::clone(points), &candidate)?;
    let score = metric.score(&index)?;
    Ok(SearchRecord::new(candidate, index, score, sequence))
}
