//! Hilbert-curve ordering of integer point sets.
//!
//! Each point is mapped to its position on the Hilbert curve with Skilling's
//! axes-to-transpose algorithm ("Programming the Hilbert curve", AIP Conf.
//! Proc. 707, 2004), after its coordinates have been reordered by an axis
//! permutation. The interleaved key bits are packed most-significant-first
//! into `u64` words, so plain lexicographic comparison of the packed keys is
//! exactly curve order. Key computation runs in parallel across points.
//!
//! Which permutation is used matters a great deal: a poor axis order
//! fragments true clusters into many disjoint stretches of the curve. The
//! optimizer in `opt-engine` searches for an order that keeps them whole.

use std::sync::Arc;

use rayon::prelude::*;

use crate::{CurveError, Point, PointSet, Result};

/// A point set viewed in Hilbert-curve order under one axis permutation.
///
/// Construction is deterministic: duplicate curve positions are broken by the
/// points' original insertion order.
#[derive(Debug, Clone)]
pub struct HilbertIndex {
    points: Arc<PointSet>,
    order: Vec<u32>,
}

impl HilbertIndex {
    /// Sort `points` along the Hilbert curve obtained by reading coordinate
    /// `axes[i]` as curve axis `i`.
    ///
    /// `axes` must be a permutation of `0..points.dims()`.
    pub fn build(points: Arc<PointSet>, axes: &[usize]) -> Result<Self> {
        let dims = points.dims();
        let bits = points.bits();
        if !is_axis_permutation(axes, dims) {
            return Err(CurveError::InvalidPermutation { degree: dims });
        }

        let words = (dims as u32 * bits).div_ceil(64) as usize;
        let mut keyed: Vec<(Vec<u64>, u32)> = points
            .points()
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                let mut coords: Vec<u32> = axes.iter().map(|&a| p[a]).collect();
                axes_to_transpose(&mut coords, bits);
                (pack_key(&coords, bits, words), i as u32)
            })
            .collect();
        keyed.par_sort_unstable();

        let order = keyed.into_iter().map(|(_, i)| i).collect();
        Ok(Self { points, order })
    }

    /// Number of points in the view.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the view is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The underlying point set.
    pub fn point_set(&self) -> &Arc<PointSet> {
        &self.points
    }

    /// Positions into the original point set, in curve order.
    pub fn sorted_ids(&self) -> &[u32] {
        &self.order
    }

    /// Iterate over the points in curve order.
    pub fn sorted_points(&self) -> impl Iterator<Item = &Point> {
        self.order.iter().map(|&i| self.points.point(i as usize))
    }
}

fn is_axis_permutation(axes: &[usize], dims: usize) -> bool {
    if axes.len() != dims {
        return false;
    }
    let mut seen = vec![false; dims];
    for &a in axes {
        if a >= dims || seen[a] {
            return false;
        }
        seen[a] = true;
    }
    true
}

/// Skilling's in-place transform from axis coordinates to the transposed
/// Hilbert index. After the call, interleaving the bits of `x` level by level
/// (axis 0 first, most significant level first) yields the scalar curve
/// position.
fn axes_to_transpose(x: &mut [u32], bits: u32) {
    let n = x.len();
    let m = 1u32 << (bits - 1);

    // Inverse undo
    let mut q = m;
    while q > 1 {
        let p = q - 1;
        for i in 0..n {
            if x[i] & q != 0 {
                x[0] ^= p;
            } else {
                let t = (x[0] ^ x[i]) & p;
                x[0] ^= t;
                x[i] ^= t;
            }
        }
        q >>= 1;
    }

    // Gray encode
    for i in 1..n {
        x[i] ^= x[i - 1];
    }
    let mut t = 0;
    let mut q = m;
    while q > 1 {
        if x[n - 1] & q != 0 {
            t ^= q - 1;
        }
        q >>= 1;
    }
    for v in x.iter_mut() {
        *v ^= t;
    }
}

/// Interleave the transposed index into `words` big-endian `u64` words:
/// highest bit level first, axis 0 first within a level.
fn pack_key(x: &[u32], bits: u32, words: usize) -> Vec<u64> {
    let mut key = vec![0u64; words];
    let mut pos = 0usize;
    for level in (0..bits).rev() {
        for &axis in x {
            if (axis >> level) & 1 != 0 {
                key[pos >> 6] |= 1u64 << (63 - (pos & 63));
            }
            pos += 1;
        }
    }
    key
}
