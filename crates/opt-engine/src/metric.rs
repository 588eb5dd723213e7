//! Fragmentation scoring of a Hilbert ordering.
//!
//! The optimizer needs a scalar objective that rises when the curve revisits
//! a true cluster in multiple disjoint stretches. The gap metric delivers
//! that: it walks the ordered sequence, splits it where consecutive points
//! jump further than a data-derived merge threshold, and counts the
//! substantial runs. Every extra fragment contributes one extra
//! above-threshold gap, so the count tracks fragmentation directly.

use curve_core::{CurveError, HilbertIndex, Result, squared_distance};
use serde::{Deserialize, Serialize};

/// A separating jump must exceed the low side by this factor before it is
/// read as a cluster boundary; smaller jumps are distribution noise.
const SEPARATION_FACTOR: u64 = 4;

/// Score of one Hilbert ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapScore {
    /// Number of runs longer than the outlier cutoff.
    pub estimated_cluster_count: usize,
    /// The widest squared gap that still fell within a run.
    pub merge_square_distance: u64,
}

/// Capability interface for scoring an ordering. The search loop only ever
/// talks to this trait, so tests can swap in scripted or failing metrics.
pub trait FragmentationMetric: Send + Sync {
    /// Estimate the cluster count of the ordered sequence.
    fn score(&self, index: &HilbertIndex) -> Result<GapScore>;
}

/// The production metric: threshold at the dominant jump of the gap
/// distribution.
///
/// The threshold rule is fixed and deterministic: sort the consecutive-pair
/// squared gaps and sample every `noise_skip_by`-th order statistic plus the
/// final one (damping lone spikes in the interior of the distribution). The
/// sampled pair with the largest absolute jump whose high side exceeds
/// [`SEPARATION_FACTOR`] times its low side locates the intra/inter boundary;
/// the threshold is then refined to the widest gap of the full distribution
/// still within a factor of the jump's low side. When no sampled jump
/// qualifies the distribution has no dominant jump and the whole sequence is
/// one cluster.
#[derive(Debug, Clone)]
pub struct GapMetric {
    outlier_size: usize,
    noise_skip_by: usize,
}

impl GapMetric {
    /// Create a metric. Runs of size at most `outlier_size` are not counted;
    /// `noise_skip_by` is the sampling stride over the sorted gap
    /// distribution (clamped to at least 1).
    pub fn new(outlier_size: usize, noise_skip_by: usize) -> Self {
        Self {
            outlier_size,
            noise_skip_by: noise_skip_by.max(1),
        }
    }

    /// Runs of size at most this are treated as outliers.
    pub fn outlier_size(&self) -> usize {
        self.outlier_size
    }

    /// Sampling stride over the sorted gap distribution.
    pub fn noise_skip_by(&self) -> usize {
        self.noise_skip_by
    }

    fn merge_threshold(&self, sorted_gaps: &[u64]) -> u64 {
        let last = *sorted_gaps.last().expect("at least one gap");
        let mut best_jump = 0u64;
        let mut best_low = 0u64;

        let mut consider = |prev: u64, cur: u64, best_jump: &mut u64, best_low: &mut u64| {
            let jump = cur - prev;
            if jump > *best_jump && cur > prev.saturating_mul(SEPARATION_FACTOR) {
                *best_jump = jump;
                *best_low = prev;
            }
        };

        let mut prev = sorted_gaps[0];
        let mut i = self.noise_skip_by;
        while i < sorted_gaps.len() {
            let cur = sorted_gaps[i];
            consider(prev, cur, &mut best_jump, &mut best_low);
            prev = cur;
            i += self.noise_skip_by;
        }
        // The maximum gap always participates, even when the stride passes it
        // by; otherwise a handful of separating gaps could hide between
        // samples.
        if (sorted_gaps.len() - 1) % self.noise_skip_by != 0 {
            consider(prev, last, &mut best_jump, &mut best_low);
        }

        if best_jump == 0 {
            return last;
        }
        // The sampled jump only locates the boundary region; up to a stride's
        // worth of gaps sit between the sampled low side and the true first
        // separator. Refine against the full distribution: the threshold is
        // the widest gap still on the near side of the jump.
        let bound = best_low.saturating_mul(SEPARATION_FACTOR);
        let idx = sorted_gaps.partition_point(|&g| g <= bound);
        sorted_gaps[idx - 1]
    }
}

impl FragmentationMetric for GapMetric {
    fn score(&self, index: &HilbertIndex) -> Result<GapScore> {
        let n = index.len();
        if n < 2 {
            return Err(CurveError::TooFewPoints { needed: 2, got: n });
        }

        let ordered: Vec<&[u32]> = index.sorted_points().map(|p| p.as_slice()).collect();
        let gaps: Vec<u64> = ordered
            .windows(2)
            .map(|pair| squared_distance(pair[0], pair[1]))
            .collect();

        let mut sorted_gaps = gaps.clone();
        sorted_gaps.sort_unstable();
        let threshold = self.merge_threshold(&sorted_gaps);

        let mut count = 0usize;
        let mut run_size = 1usize;
        let mut widest = 0u64;
        for &gap in &gaps {
            if gap <= threshold {
                run_size += 1;
                widest = widest.max(gap);
            } else {
                if run_size > self.outlier_size {
                    count += 1;
                }
                run_size = 1;
            }
        }
        if run_size > self.outlier_size {
            count += 1;
        }

        Ok(GapScore {
            estimated_cluster_count: count,
            merge_square_distance: widest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve_core::{Point, PointSet};
    use std::sync::Arc;

    /// One-dimensional sets sort naturally, so curve order (and therefore
    /// every gap) is spelled out directly by the fixture.
    fn line_index(coords: Vec<u32>) -> HilbertIndex {
        let points = coords.into_iter().map(|c| Point::new(vec![c])).collect();
        let set = Arc::new(PointSet::new(points, 20).unwrap());
        HilbertIndex::build(set, &[0]).unwrap()
    }

    #[test]
    fn test_two_well_separated_clusters() {
        let mut coords: Vec<u32> = (0..20).map(|i| i * 3).collect();
        coords.extend((0..20).map(|i| 100_000 + i * 3));
        let metric = GapMetric::new(2, 3);
        let score = metric.score(&line_index(coords)).unwrap();
        assert_eq!(score.estimated_cluster_count, 2);
        // Widest in-cluster step is the 3-wide stride.
        assert_eq!(score.merge_square_distance, 9);
    }

    #[test]
    fn test_single_tight_cluster() {
        // Uniform small gaps: no dominant jump, so everything merges.
        let coords: Vec<u32> = (0..50).map(|i| 1000 + i * 2).collect();
        let metric = GapMetric::new(2, 3);
        let score = metric.score(&line_index(coords)).unwrap();
        assert_eq!(score.estimated_cluster_count, 1);
        assert_eq!(score.merge_square_distance, 4);
    }

    #[test]
    fn test_outlier_runs_are_not_counted() {
        // Three big clusters plus one 2-point blip between them.
        let mut coords: Vec<u32> = (0..30).collect();
        coords.extend([50_000, 50_001]);
        coords.extend(200_000..200_030);
        coords.extend(400_000..400_030);
        let metric = GapMetric::new(5, 3);
        let score = metric.score(&line_index(coords.clone())).unwrap();
        assert_eq!(score.estimated_cluster_count, 3);

        // With the cutoff lowered the blip counts too.
        let metric = GapMetric::new(1, 3);
        let score = metric.score(&line_index(coords)).unwrap();
        assert_eq!(score.estimated_cluster_count, 4);
    }

    #[test]
    fn test_more_fragments_score_worse() {
        let two_runs = {
            let mut c: Vec<u32> = (0..40).collect();
            c.extend(500_000..500_040);
            c
        };
        let four_runs = {
            let mut c: Vec<u32> = (0..20).collect();
            c.extend(250_000..250_020);
            c.extend(500_000..500_020);
            c.extend(750_000..750_020);
            c
        };
        let metric = GapMetric::new(2, 3);
        let a = metric.score(&line_index(two_runs)).unwrap();
        let b = metric.score(&line_index(four_runs)).unwrap();
        assert!(b.estimated_cluster_count > a.estimated_cluster_count);
    }

    #[test]
    fn test_rejects_single_point() {
        let metric = GapMetric::new(2, 3);
        let err = metric.score(&line_index(vec![42])).unwrap_err();
        assert!(matches!(err, CurveError::TooFewPoints { needed: 2, got: 1 }));
    }

    #[test]
    fn test_deterministic() {
        let coords: Vec<u32> = (0..25).map(|i| i * 17 % 400).collect();
        let metric = GapMetric::new(2, 2);
        let a = metric.score(&line_index(coords.clone())).unwrap();
        let b = metric.score(&line_index(coords)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicate_points_share_a_run() {
        let coords = vec![10, 10, 10, 11, 12, 90_000, 90_000, 90_001];
        let metric = GapMetric::new(1, 1);
        let score = metric.score(&line_index(coords)).unwrap();
        assert_eq!(score.estimated_cluster_count, 2);
    }
}
