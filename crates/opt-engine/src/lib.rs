//! Optimal index search: axis-permutation optimization for Hilbert-curve
//! clustering.
//!
//! The Hilbert curve linearizes a point set while preserving locality, but
//! how well clusters survive the linearization depends on the order in which
//! the coordinate axes feed the curve. This crate searches the space of axis
//! permutations for one that minimizes cluster fragmentation.
//!
//! This crate provides:
//! - A scramble-based [`Permutation`] over coordinate axes
//! - A gap-statistic fragmentation metric ([`GapMetric`])
//! - A cooling [`MutationSchedule`] that narrows the scramble width per round
//! - The batched parallel [`OptimalIndexSearch`] loop with a bounded top-K
//!   result pool and convergence-based early stopping

pub mod metric;
pub mod permutation;
pub mod record;
pub mod schedule;
pub mod search;
mod trial;

pub use metric::{FragmentationMetric, GapMetric, GapScore};
pub use permutation::Permutation;
pub use record::SearchRecord;
pub use schedule::{HalvingSchedule, MutationSchedule};
pub use search::{MIN_POINTS, OptimalIndexSearch, SearchBuilder, SearchConfig};
