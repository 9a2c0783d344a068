//! Vertex equality keys.
//!
//! Soup vertices are never index-shared, so "the same point" is a judgement
//! about coordinates. Every keyed structure in the crate (vertex buckets,
//! edge candidate maps, on-plane sets) goes through [`PointKey`] so that the
//! judgement is made in exactly one place, under one [`VertexMatching`]
//! policy.

use crate::float_types::Real;
use nalgebra::Point3;

/// Decimal grid used by [`VertexMatching::Rounded`].
///
/// Coarse enough to absorb the jitter of coordinates that went through an
/// f32 export, fine enough that distinct vertices of any sane mesh stay
/// distinct.
pub(crate) const ROUNDING_FACTOR: Real = 1e6;

/// How two soup vertices are judged to be the same point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexMatching {
    /// Bit-for-bit coordinate equality. Right for soups whose duplicate
    /// vertices were produced by copying, like a fresh STL tessellation.
    #[default]
    Exact,
    /// Coordinates rounded onto a fixed decimal grid before comparing.
    /// Right for soups that passed through lossy serialization.
    Rounded,
}

/// Hashable identity of a vertex under some [`VertexMatching`] policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey(i64, i64, i64);

impl VertexMatching {
    /// Key for one point. Keys from different policies are never mixed.
    #[inline]
    pub fn key(self, p: &Point3<Real>) -> PointKey {
        match self {
            VertexMatching::Exact => {
                PointKey(exact_bits(p.x), exact_bits(p.y), exact_bits(p.z))
            },
            VertexMatching::Rounded => PointKey(
                (p.x * ROUNDING_FACTOR).round() as i64,
                (p.y * ROUNDING_FACTOR).round() as i64,
                (p.z * ROUNDING_FACTOR).round() as i64,
            ),
        }
    }
}

/// Bit pattern of one scalar. `-0.0` and `0.0` must land on the same key.
#[inline]
fn exact_bits(x: Real) -> i64 {
    let x = if x == 0.0 { 0.0 } else { x };
    x.to_bits() as i64
}

/// A directed soup edge named by its endpoint keys, in traversal order.
pub(crate) type EdgeKey = (PointKey, PointKey);
