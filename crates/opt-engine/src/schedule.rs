//! Cooling schedule for the permutation mutator.

use rand::Rng;

use crate::permutation::Permutation;

/// Decides how wide a scramble each round of the search may take.
pub trait MutationSchedule: Send + Sync {
    /// Derive the next candidate from `base` for the given zero-based round.
    fn next<R: Rng>(&self, base: &Permutation, iteration: usize, rng: &mut R) -> Permutation;
}

/// Halving schedule: scramble `max(min(D, 5), D >> iteration)` axes.
///
/// Round zero rescrambles everything; each following round halves the reach
/// until it floors at five axes, so the search moves from broad exploration
/// to local refinement without ever going fully still.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalvingSchedule;

impl HalvingSchedule {
    /// Number of axes the schedule scrambles at `iteration` for degree `d`.
    pub fn width(d: usize, iteration: usize) -> usize {
        let broad = if iteration >= usize::BITS as usize {
            0
        } else {
            d >> iteration
        };
        broad.max(d.min(5))
    }
}

impl MutationSchedule for HalvingSchedule {
    fn next<R: Rng>(&self, base: &Permutation, iteration: usize, rng: &mut R) -> Permutation {
        base.scramble(Self::width(base.degree(), iteration), rng)
    }
}
