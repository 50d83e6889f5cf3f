// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.
//!
//! Every rectangle in this crate is an axis-aligned box described by its
//! minimum (top-left) and maximum (bottom-right) corners. The same type backs
//! both quadtree cell membership and query-rectangle tests, so the two
//! operations cannot drift apart:
//!
//! - [`Aabb2D::contains_point`] and [`Aabb2D::overlaps`] are edge-inclusive.
//!   They are used for query rectangles.
//! - [`Aabb2D::contains_point_half_open`] excludes the maximum edges. It is
//!   used for quadtree cells so that the four quadrants of a cell partition it
//!   exactly and every point belongs to at most one child.

use core::cmp::Ordering;
use core::fmt::Debug;

/// Axis-aligned bounding box in 2D.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Aabb2D<T> {
    /// Minimum x (left)
    pub min_x: T,
    /// Minimum y (top)
    pub min_y: T,
    /// Maximum x (right)
    pub max_x: T,
    /// Maximum y (bottom)
    pub max_y: T,
}

impl<T> Aabb2D<T> {
    /// Create a new AABB from min/max corners.
    #[inline(always)]
    pub const fn new(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

impl<T: Copy + PartialOrd> Aabb2D<T> {
    /// Whether this AABB contains the point, edges included.
    #[inline]
    pub fn contains_point(&self, x: T, y: T) -> bool {
        self.min_x <= x && self.min_y <= y && x <= self.max_x && y <= self.max_y
    }

    /// Whether this AABB contains the point, excluding the maximum edges.
    ///
    /// ```
    /// use dwell_index::Aabb2D;
    ///
    /// let cell = Aabb2D::new(0.0, 0.0, 10.0, 10.0);
    /// assert!(cell.contains_point_half_open(0.0, 0.0));
    /// assert!(!cell.contains_point_half_open(10.0, 5.0));
    /// ```
    #[inline]
    pub fn contains_point_half_open(&self, x: T, y: T) -> bool {
        self.min_x <= x && self.min_y <= y && x < self.max_x && y < self.max_y
    }

    /// The intersection of two AABBs.
    #[inline]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            min_x: max_t(self.min_x, other.min_x),
            min_y: max_t(self.min_y, other.min_y),
            max_x: min_t(self.max_x, other.max_x),
            max_y: min_t(self.max_y, other.max_y),
        }
    }

    /// Determines whether this AABB overlaps with another in any way.
    ///
    /// Note that the edge of the AABB is considered to be part of itself, meaning
    /// that two AABBs that share an edge are considered to overlap.
    ///
    /// # Examples
    ///
    /// ```
    /// use dwell_index::Aabb2D;
    ///
    /// let aabb1 = Aabb2D::new(0.0, 0.0, 10.0, 10.0);
    /// let aabb2 = Aabb2D::new(10.0, 0.0, 20.0, 10.0);
    /// assert!(aabb1.overlaps(&aabb2));
    ///
    /// let aabb3 = Aabb2D::new(11.0, 0.0, 20.0, 10.0);
    /// assert!(!aabb1.overlaps(&aabb3));
    /// ```
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Return true if the AABB is empty or inverted (no area). Assumes no NaN.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max_x <= self.min_x || self.max_y <= self.min_y
    }
}

impl<T: Scalar> Aabb2D<T> {
    /// Create an AABB from its top-left origin and size.
    #[inline]
    pub fn from_xywh(x: T, y: T, w: T, h: T) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: T::add(x, w),
            max_y: T::add(y, h),
        }
    }

    /// Create an AABB of the given size centered on a point.
    #[inline]
    pub fn from_center(cx: T, cy: T, w: T, h: T) -> Self {
        let min_x = T::sub(cx, T::half(w));
        let min_y = T::sub(cy, T::half(h));
        Self::from_xywh(min_x, min_y, w, h)
    }

    /// Center point `(x, y)` of the AABB.
    #[inline]
    pub fn center(&self) -> (T, T) {
        (
            T::mid(self.min_x, self.max_x),
            T::mid(self.min_y, self.max_y),
        )
    }

    /// Split into four equal quadrants, in `[NE, NW, SE, SW]` order.
    ///
    /// The y axis grows downwards, so "north" is the half with smaller `y`.
    pub fn quadrants(&self) -> [Self; 4] {
        let (cx, cy) = self.center();
        [
            Self::new(cx, self.min_y, self.max_x, cy),
            Self::new(self.min_x, self.min_y, cx, cy),
            Self::new(cx, cy, self.max_x, self.max_y),
            Self::new(self.min_x, cy, cx, self.max_y),
        ]
    }
}

/// Numeric scalar abstraction for 2D AABBs.
///
/// This trait provides the minimal set of operations needed for centroid
/// computations and quadrant splits.
pub trait Scalar: Copy + PartialOrd + Debug {
    /// Add two scalar values.
    fn add(a: Self, b: Self) -> Self;

    /// Subtract two scalar values: a - b.
    fn sub(a: Self, b: Self) -> Self;

    /// Zero value for the scalar type.
    fn zero() -> Self;

    /// Half of a value (rounded toward -∞ for integers).
    fn half(v: Self) -> Self;

    /// Midpoint between a and b.
    fn mid(a: Self, b: Self) -> Self;
}

impl Scalar for f32 {
    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline(always)]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn half(v: Self) -> Self {
        0.5 * v
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }
}

impl Scalar for f64 {
    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    #[inline(always)]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn half(v: Self) -> Self {
        0.5 * v
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }
}

impl Scalar for i64 {
    #[inline]
    fn add(a: Self, b: Self) -> Self {
        a.saturating_add(b)
    }

    #[inline]
    fn sub(a: Self, b: Self) -> Self {
        a.saturating_sub(b)
    }

    #[inline(always)]
    fn zero() -> Self {
        0
    }

    #[inline]
    fn half(v: Self) -> Self {
        v >> 1
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        // Average without overflow: (a & b) + ((a ^ b) >> 1)
        (a & b) + ((a ^ b) >> 1)
    }
}

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}
