//! # Curvecluster Core
//!
//! Integer point sets and the Hilbert-curve machinery behind curvecluster.
//!
//! High-dimensional integer points are mapped onto a Hilbert space-filling
//! curve, which linearizes them while preserving spatial locality: points that
//! are close in space tend to be close along the curve. Clusters are then
//! recovered by scanning the linear order and cutting it wherever consecutive
//! points are too far apart.
//!
//! This crate provides the building blocks:
//!
//! - **Point / PointSet**: validated integer points with shared dimensionality
//!   and coordinate width
//! - **HilbertIndex**: a point set viewed in Hilbert-curve order under a given
//!   axis permutation
//! - **BoundedMaxHeap**: a capacity-bounded heap that keeps the K best items
//! - **partition**: materialize cluster labels from a sorted view and a merge
//!   threshold
//!
//! The axis-permutation optimizer that drives these primitives lives in the
//! `opt-engine` crate.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use curve_core::{HilbertIndex, Point, PointSet};
//!
//! let points = vec![Point::new(vec![1, 2]), Point::new(vec![900, 901])];
//! let set = Arc::new(PointSet::new(points, 10)?);
//! let index = HilbertIndex::build(set, &[0, 1])?;
//! for p in index.sorted_points() {
//!     println!("{p:?}");
//! }
//! ```

pub mod distance;
pub mod heap;
pub mod hilbert;
pub mod partition;

pub use distance::squared_distance;
pub use heap::BoundedMaxHeap;
pub use hilbert::HilbertIndex;
pub use partition::{ClusterLabel, partition};

use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Widest supported coordinate width, in bits.
///
/// Capped so that squared Euclidean distances between points of any realistic
/// dimensionality still fit in a `u64`.
pub const MAX_BITS: u32 = 24;

/// A single point: non-negative integer coordinates of a fixed width.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    data: Vec<u32>,
}

impl Point {
    /// Create a new point from raw coordinates.
    pub fn new(data: Vec<u32>) -> Self {
        Self { data }
    }

    /// Dimensionality of this point.
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    /// Get the raw coordinate slice.
    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }
}

impl Deref for Point {
    type Target = [u32];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl From<Vec<u32>> for Point {
    fn from(data: Vec<u32>) -> Self {
        Self::new(data)
    }
}

/// An owned, validated collection of points sharing dimensionality and
/// coordinate width.
///
/// Construction checks the shape once; everything downstream (Hilbert
/// encoding, distances, the optimizer) relies on it and never re-validates.
#[derive(Debug, Clone)]
pub struct PointSet {
    points: Vec<Point>,
    dims: usize,
    bits: u32,
}

impl PointSet {
    /// Create a point set from points of identical dimensionality whose
    /// coordinates all fit in `bits` bits.
    pub fn new(points: Vec<Point>, bits: u32) -> Result<Self> {
        if bits == 0 || bits > MAX_BITS {
            return Err(CurveError::InvalidBits { bits });
        }
        let dims = match points.first() {
            Some(p) if p.dim() > 0 => p.dim(),
            _ => return Err(CurveError::EmptyInput),
        };
        let limit = 1u32 << bits;
        for p in &points {
            if p.dim() != dims {
                return Err(CurveError::DimensionMismatch {
                    expected: dims,
                    got: p.dim(),
                });
            }
            if let Some(&value) = p.iter().find(|&&c| c >= limit) {
                return Err(CurveError::CoordinateOverflow { bits, value });
            }
        }
        Ok(Self { points, dims, bits })
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shared dimensionality of all points.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Coordinate width in bits.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Get a point by position.
    pub fn point(&self, i: usize) -> &Point {
        &self.points[i]
    }

    /// All points, in insertion order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Iterate over the points in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }
}

/// Error types for curve operations.
#[derive(Debug, thiserror::Error)]
pub enum CurveError {
    #[error("too few points: need at least {needed}, got {got}")]
    TooFewPoints { needed: usize, got: usize },

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("coordinate {value} does not fit in {bits} bits")]
    CoordinateOverflow { bits: u32, value: u32 },

    #[error("coordinate width must be between 1 and {MAX_BITS} bits, got {bits}")]
    InvalidBits { bits: u32 },

    #[error("not a permutation of 0..{degree}")]
    InvalidPermutation { degree: usize },

    #[error("empty input")]
    EmptyInput,
}

pub type Result<T> = std::result::Result<T, CurveError>;
