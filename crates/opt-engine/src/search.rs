//! The optimal index search loop.
//!
//! Iterated rounds of batched parallel trials over the permutation space.
//! Each round scrambles the best-so-far permutation into `parallel_trials`
//! candidates, evaluates them concurrently on the rayon pool, and admits the
//! results into a bounded top-K pool plus a monotone best-so-far. The search
//! stops once `max_stale_rounds` consecutive rounds fail to improve, or when
//! the round budget runs out.
//!
//! Reproducibility: the master seed fully determines a run. Candidates are
//! derived from the seeded generator in trial order before the parallel
//! phase, and results are admitted in that same order after it, so thread
//! scheduling can never leak into the output.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use curve_core::{BoundedMaxHeap, CurveError, HilbertIndex, PointSet, Result};

use crate::metric::{FragmentationMetric, GapMetric};
use crate::permutation::Permutation;
use crate::record::SearchRecord;
use crate::schedule::{HalvingSchedule, MutationSchedule};
use crate::trial::run_trial;

/// Minimum number of points a search accepts.
pub const MIN_POINTS: usize = 10;

/// Trials launched per round when configured through the builder.
const DEFAULT_PARALLEL_TRIALS: usize = 4;

/// Search configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Trials launched per round.
    pub parallel_trials: usize,
    /// Maximum number of rounds.
    pub max_iterations: usize,
    /// Consecutive non-improving rounds before the search stops early.
    pub max_stale_rounds: usize,
    /// Runs of size at most this are not counted as clusters.
    pub outlier_size: usize,
    /// Sampling stride of the metric's gap-distribution smoothing.
    pub noise_skip_by: usize,
    /// Master seed for the candidate generator.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            parallel_trials: DEFAULT_PARALLEL_TRIALS,
            max_iterations: 10,
            max_stale_rounds: 3,
            outlier_size: 10,
            noise_skip_by: 3,
            seed: 0,
        }
    }
}

/// Searches the axis-permutation space for the ordering that fragments the
/// point set least along the Hilbert curve.
///
/// The metric and mutation schedule are the two variation points; production
/// code uses [`GapMetric`] and [`HalvingSchedule`].
pub struct OptimalIndexSearch<M = GapMetric, S = HalvingSchedule> {
    config: SearchConfig,
    metric: M,
    schedule: S,
}

impl OptimalIndexSearch {
    /// Create a search with the production metric and schedule.
    pub fn new(config: SearchConfig) -> Self {
        let metric = GapMetric::new(config.outlier_size, config.noise_skip_by);
        Self {
            config,
            metric,
            schedule: HalvingSchedule,
        }
    }

    /// Start building a search from a trial budget.
    pub fn builder() -> SearchBuilder {
        SearchBuilder::default()
    }
}

impl<M, S> OptimalIndexSearch<M, S>
where
    M: FragmentationMetric,
    S: MutationSchedule,
{
    /// Create a search from explicit parts. The metric parameters inside
    /// `config` are informational here; `metric` is used as given.
    pub fn with_parts(config: SearchConfig, metric: M, schedule: S) -> Self {
        Self {
            config,
            metric,
            schedule,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Find the single best permutation, starting from the identity.
    pub fn search(&self, points: Arc<PointSet>) -> Result<SearchRecord> {
        let mut records = self.search_many(points, 1, None)?;
        Ok(records.remove(0))
    }

    /// Find the single best permutation from an explicit starting point.
    pub fn search_with_start(
        &self,
        points: Arc<PointSet>,
        start: Permutation,
    ) -> Result<SearchRecord> {
        let mut records = self.search_many(points, 1, Some(start))?;
        Ok(records.remove(0))
    }

    /// Find up to `k` permutations, best first.
    ///
    /// Falls back to the identity permutation when `start` is omitted. The
    /// returned list is never empty on success: the seed evaluation is always
    /// retained.
    pub fn search_many(
        &self,
        points: Arc<PointSet>,
        k: usize,
        start: Option<Permutation>,
    ) -> Result<Vec<SearchRecord>> {
        if points.len() < MIN_POINTS {
            return Err(CurveError::TooFewPoints {
                needed: MIN_POINTS,
                got: points.len(),
            });
        }
        let dims = points.dims();
        let start = start.unwrap_or_else(|| Permutation::identity(dims));
        let parallel_trials = self.config.parallel_trials.max(1);

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut sequence: u64 = 0;

        // Seed: score the starting permutation and install it everywhere.
        let seed_index = HilbertIndex::build(Arc::clone(&points), &start)?;
        let seed_score = self.metric.score(&seed_index)?;
        let seed_record = SearchRecord::new(start, seed_index, seed_score, sequence);
        sequence += 1;

        let mut pool = BoundedMaxHeap::new(k);
        let mut best = seed_record.clone();
        pool.add_remove(seed_record);
        tracing::debug!(
            points = points.len(),
            dims,
            count = best.estimated_cluster_count(),
            "seeded permutation search"
        );

        let mut stale_rounds = 0usize;
        let mut converged = false;
        for iteration in 0..self.config.max_iterations {
            // All trials of a round mutate from the same base; improvements
            // landing mid-round do not re-seed it.
            let base = best.permutation().clone();
            let candidates: Vec<(u64, Permutation)> = (0..parallel_trials)
                .map(|_| {
                    let candidate = self.schedule.next(&base, iteration, &mut rng);
                    let seq = sequence;
                    sequence += 1;
                    (seq, candidate)
                })
                .collect();

            let results: Vec<Result<SearchRecord>> = candidates
                .into_par_iter()
                .map(|(seq, candidate)| run_trial(&points, candidate, &self.metric, seq))
                .collect();

            // Admissions happen in trial order: insert into the pool, then
            // replace best-so-far on strict improvement.
            let mut improvements = 0usize;
            for result in results {
                match result {
                    Ok(record) => {
                        if record.is_better_than(&best) {
                            best = record.clone();
                            improvements += 1;
                        }
                        pool.add_remove(record);
                    }
                    Err(error) => {
                        tracing::warn!(iteration, %error, "trial failed; counted as non-improving");
                    }
                }
            }

            if improvements == 0 {
                stale_rounds += 1;
            } else {
                stale_rounds = 0;
            }
            tracing::debug!(
                iteration,
                improvements,
                stale_rounds,
                best = best.estimated_cluster_count(),
                "round complete"
            );
            if stale_rounds >= self.config.max_stale_rounds {
                converged = true;
                break;
            }
        }

        tracing::info!(
            outcome = if converged { "converged" } else { "exhausted" },
            best = best.estimated_cluster_count(),
            retained = pool.len(),
            "permutation search finished"
        );
        Ok(pool.into_sorted_vec())
    }
}

/// Builder for [`OptimalIndexSearch`] configured from a total trial budget.
///
/// `max_trials` is spread over rounds of four parallel trials:
/// `max_iterations = ceil(max_trials / 4)`.
#[derive(Debug, Clone)]
pub struct SearchBuilder {
    outlier_size: usize,
    noise_skip_by: usize,
    max_trials: usize,
    max_stale_rounds: usize,
    seed: u64,
}

impl Default for SearchBuilder {
    fn default() -> Self {
        let config = SearchConfig::default();
        Self {
            outlier_size: config.outlier_size,
            noise_skip_by: config.noise_skip_by,
            max_trials: config.max_iterations * DEFAULT_PARALLEL_TRIALS,
            max_stale_rounds: config.max_stale_rounds,
            seed: config.seed,
        }
    }
}

impl SearchBuilder {
    /// Runs of size at most this are not counted as clusters.
    pub fn outlier_size(mut self, outlier_size: usize) -> Self {
        self.outlier_size = outlier_size;
        self
    }

    /// Sampling stride of the metric's gap-distribution smoothing.
    pub fn noise_skip_by(mut self, noise_skip_by: usize) -> Self {
        self.noise_skip_by = noise_skip_by;
        self
    }

    /// Total trial budget across all rounds.
    pub fn max_trials(mut self, max_trials: usize) -> Self {
        self.max_trials = max_trials;
        self
    }

    /// Consecutive non-improving rounds before stopping early.
    pub fn max_stale_rounds(mut self, max_stale_rounds: usize) -> Self {
        self.max_stale_rounds = max_stale_rounds;
        self
    }

    /// Master seed for the candidate generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the search.
    pub fn build(self) -> OptimalIndexSearch {
        let config = SearchConfig {
            parallel_trials: DEFAULT_PARALLEL_TRIALS,
            max_iterations: self.max_trials.div_ceil(DEFAULT_PARALLEL_TRIALS),
            max_stale_rounds: self.max_stale_rounds,
            outlier_size: self.outlier_size,
            noise_skip_by: self.noise_skip_by,
            seed: self.seed,
        };
        OptimalIndexSearch::new(config)
    }
}
