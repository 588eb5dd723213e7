//! Result records produced by search trials.

use std::cmp::Ordering;

use curve_core::HilbertIndex;

use crate::metric::GapScore;
use crate::permutation::Permutation;

/// Immutable outcome of one trial: the candidate permutation, the Hilbert
/// view it produced, and its score.
///
/// Records order by estimated cluster count (fewer is better), with the
/// admission sequence number as tie-break. The tie-break makes the total
/// order, and with it the contents of the bounded result pool, a pure
/// function of the set of records, independent of admission interleaving.
#[derive(Debug, Clone)]
pub struct SearchRecord {
    permutation: Permutation,
    index: HilbertIndex,
    score: GapScore,
    sequence: u64,
}

impl SearchRecord {
    pub(crate) fn new(
        permutation: Permutation,
        index: HilbertIndex,
        score: GapScore,
        sequence: u64,
    ) -> Self {
        Self {
            permutation,
            index,
            score,
            sequence,
        }
    }

    /// The axis permutation this record was scored under.
    pub fn permutation(&self) -> &Permutation {
        &self.permutation
    }

    /// The Hilbert view built for the permutation.
    pub fn index(&self) -> &HilbertIndex {
        &self.index
    }

    /// The full score.
    pub fn score(&self) -> GapScore {
        self.score
    }

    /// Estimated number of substantial clusters along the curve.
    pub fn estimated_cluster_count(&self) -> usize {
        self.score.estimated_cluster_count
    }

    /// Widest squared gap that still fell within a cluster; the natural merge
    /// threshold for downstream materialization.
    pub fn merge_square_distance(&self) -> u64 {
        self.score.merge_square_distance
    }

    /// Trial sequence number; 0 is the seed record.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Strictly fewer estimated clusters than `other`.
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.score.estimated_cluster_count < other.score.estimated_cluster_count
    }
}

impl PartialEq for SearchRecord {
    fn eq(&self, other: &Self) -> bool {
        self.score.estimated_cluster_count == other.score.estimated_cluster_count
            && self.sequence == other.sequence
    }
}

impl Eq for SearchRecord {}

impl PartialOrd for SearchRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.score.estimated_cluster_count, self.sequence)
            .cmp(&(other.score.estimated_cluster_count, other.sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve_core::{Point, PointSet};
    use std::sync::Arc;

    fn record(count: usize, sequence: u64) -> SearchRecord {
        let set = Arc::new(
            PointSet::new(vec![Point::new(vec![0]), Point::new(vec![1])], 4).unwrap(),
        );
        let index = HilbertIndex::build(set, &[0]).unwrap();
        SearchRecord::new(
            Permutation::identity(1),
            index,
            GapScore {
                estimated_cluster_count: count,
                merge_square_distance: 0,
            },
            sequence,
        )
    }

    #[test]
    fn test_is_better_than_is_strict() {
        assert!(record(3, 0).is_better_than(&record(4, 1)));
        assert!(!record(4, 0).is_better_than(&record(4, 1)));
        assert!(!record(5, 0).is_better_than(&record(4, 1)));
    }

    #[test]
    fn test_ordering_breaks_ties_by_sequence() {
        let mut records = vec![record(4, 7), record(3, 9), record(4, 2)];
        records.sort();
        let keys: Vec<(usize, u64)> = records
            .iter()
            .map(|r| (r.estimated_cluster_count(), r.sequence()))
            .collect();
        assert_eq!(keys, vec![(3, 9), (4, 2), (4, 7)]);
    }
}
