//! Cluster materialization from a Hilbert-ordered view.
//!
//! The optimizer's job ends at the best permutation and its merge distance;
//! turning those into per-point cluster labels is this module. The walk is
//! the same one the fragmentation metric performs: consecutive points whose
//! gap stays within the merge threshold share a cluster, a wider gap starts
//! the next one.

use crate::hilbert::HilbertIndex;
use crate::squared_distance;

/// Cluster id assigned to a point. Ids are dense and numbered in curve order.
pub type ClusterLabel = u32;

/// Assign a cluster label to every point of the view.
///
/// Returns one label per point of the underlying set, aligned with the set's
/// insertion order. Consecutive points in curve order whose squared gap is
/// at most `merge_threshold` receive the same label.
pub fn partition(index: &HilbertIndex, merge_threshold: u64) -> Vec<ClusterLabel> {
    let mut labels = vec![0 as ClusterLabel; index.len()];
    let mut current: ClusterLabel = 0;
    let mut prev: Option<&[u32]> = None;
    for (&id, point) in index.sorted_ids().iter().zip(index.sorted_points()) {
        if let Some(prev) = prev {
            if squared_distance(prev, point) > merge_threshold {
                current += 1;
            }
        }
        labels[id as usize] = current;
        prev = Some(point);
    }
    labels
}

/// Sizes of the clusters produced by [`partition`], indexed by label.
pub fn cluster_sizes(labels: &[ClusterLabel]) -> Vec<usize> {
    let mut sizes = Vec::new();
    for &label in labels {
        let label = label as usize;
        if label >= sizes.len() {
            sizes.resize(label + 1, 0);
        }
        sizes[label] += 1;
    }
    sizes
}
