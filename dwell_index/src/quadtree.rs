// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point-region quadtree over anchored AABBs.
//!
//! Items are placed by their *anchor*, the center of their AABB. A cell owns an
//! anchor when the anchor lies in the cell's half-open rectangle, so the four
//! quadrants of a subdivided cell partition it without overlap. A range query
//! descends only into cells that overlap the query rectangle and yields the
//! items whose anchor lies inside that rectangle (edges included).

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use smallvec::SmallVec;

use crate::types::{Aabb2D, Scalar};

/// Subdivision depth after which a cell stores items beyond its capacity.
///
/// Without a cap, many items sharing one anchor would subdivide forever.
pub const DEFAULT_MAX_DEPTH: u8 = 16;

/// Error returned by [`QuadTree::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InsertError<T: Debug> {
    /// The item's anchor is outside the root boundary. The item was not stored.
    ///
    /// This usually means the boundary was computed before a layout change.
    #[error("anchor ({x:?}, {y:?}) lies outside the quadtree boundary")]
    OutOfBounds {
        /// Anchor x.
        x: T,
        /// Anchor y.
        y: T,
    },
}

/// An entry stored in a [`QuadTree`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Item<T, P> {
    /// Bounds of the entry; its center is the anchor.
    pub aabb: Aabb2D<T>,
    /// Caller payload.
    pub payload: P,
}

#[derive(Clone)]
struct Cell<T: Scalar, P: Copy> {
    boundary: Aabb2D<T>,
    items: SmallVec<[Item<T, P>; 8]>,
    children: Option<Box<[Self; 4]>>,
}

impl<T: Scalar, P: Copy> Cell<T, P> {
    fn new(boundary: Aabb2D<T>) -> Self {
        Self {
            boundary,
            items: SmallVec::new(),
            children: None,
        }
    }

    /// Store an item whose anchor this cell is known to own.
    fn insert(&mut self, item: Item<T, P>, capacity: usize, depth_left: u8) {
        if self.children.is_none() {
            if self.items.len() < capacity || depth_left == 0 {
                self.items.push(item);
                return;
            }
            let [ne, nw, se, sw] = self.boundary.quadrants();
            self.children = Some(Box::new([
                Self::new(ne),
                Self::new(nw),
                Self::new(se),
                Self::new(sw),
            ]));
        }

        let (x, y) = item.aabb.center();
        if let Some(children) = self.children.as_mut()
            && let Some(child) = children
                .iter_mut()
                .find(|c| c.boundary.contains_point_half_open(x, y))
        {
            child.insert(item, capacity, depth_left.saturating_sub(1));
            return;
        }
        // Degenerate cells (zero width after integer halving) own nothing;
        // keep the item here so it stays reachable.
        self.items.push(item);
    }
}

/// A capacity-bounded point-region quadtree.
///
/// The tree is meant to be built in one pass over a full item set and then
/// queried; there is no removal. To reflect changed geometry, build a new tree
/// and drop the old one.
///
/// ## Example
///
/// ```rust
/// use dwell_index::{Aabb2D, QuadTree};
///
/// let mut tree: QuadTree<f64, u32> = QuadTree::new(Aabb2D::new(0.0, 0.0, 200.0, 200.0), 4);
/// tree.insert(Aabb2D::from_xywh(0.0, 0.0, 10.0, 10.0), 1).unwrap();
/// tree.insert(Aabb2D::from_xywh(100.0, 100.0, 10.0, 10.0), 2).unwrap();
///
/// let hits: Vec<u32> = tree.query_rect(Aabb2D::from_xywh(0.0, 0.0, 20.0, 20.0)).collect();
/// assert_eq!(hits, vec![1]);
///
/// // Anchors outside the boundary are rejected, not silently dropped.
/// assert!(tree.insert(Aabb2D::from_xywh(500.0, 0.0, 10.0, 10.0), 3).is_err());
/// assert_eq!(tree.len(), 2);
/// ```
#[derive(Clone)]
pub struct QuadTree<T: Scalar, P: Copy> {
    root: Cell<T, P>,
    capacity: usize,
    max_depth: u8,
    len: usize,
}

impl<T: Scalar, P: Copy> Debug for QuadTree<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QuadTree")
            .field("boundary", &self.root.boundary)
            .field("capacity", &self.capacity)
            .field("max_depth", &self.max_depth)
            .field("len", &self.len)
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

impl<T: Scalar, P: Copy> QuadTree<T, P> {
    /// Create an empty tree over `boundary` whose cells hold up to `capacity` items.
    ///
    /// A `capacity` of zero is treated as one.
    pub fn new(boundary: Aabb2D<T>, capacity: usize) -> Self {
        debug_assert!(!boundary.is_empty(), "quadtree boundary must have an area");
        Self {
            root: Cell::new(boundary),
            capacity: capacity.max(1),
            max_depth: DEFAULT_MAX_DEPTH,
            len: 0,
        }
    }

    /// Override the subdivision depth cap (see [`DEFAULT_MAX_DEPTH`]).
    pub fn with_max_depth(mut self, max_depth: u8) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Build a tree over `boundary` from a full item set.
    ///
    /// Construction never fails: items whose anchor lies outside the boundary
    /// are returned in the second tuple slot, in input order, so the caller can
    /// decide whether they indicate a stale boundary.
    pub fn build<I>(boundary: Aabb2D<T>, capacity: usize, items: I) -> (Self, Vec<Item<T, P>>)
    where
        I: IntoIterator<Item = (Aabb2D<T>, P)>,
    {
        let mut tree = Self::new(boundary, capacity);
        let mut rejected = Vec::new();
        for (aabb, payload) in items {
            if tree.insert(aabb, payload).is_err() {
                rejected.push(Item { aabb, payload });
            }
        }
        (tree, rejected)
    }

    /// Insert an item, placing it by the center of `aabb`.
    pub fn insert(&mut self, aabb: Aabb2D<T>, payload: P) -> Result<(), InsertError<T>> {
        let (x, y) = aabb.center();
        if !self.root.boundary.contains_point_half_open(x, y) {
            return Err(InsertError::OutOfBounds { x, y });
        }
        self.root
            .insert(Item { aabb, payload }, self.capacity, self.max_depth);
        self.len += 1;
        Ok(())
    }

    /// The root boundary.
    pub fn boundary(&self) -> Aabb2D<T> {
        self.root.boundary
    }

    /// Per-cell capacity before subdivision.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of successfully inserted items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no item has been inserted.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of cell levels, counting the root as one.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = alloc::vec![(&self.root, 1_usize)];
        while let Some((cell, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Some(children) = &cell.children {
                stack.extend(children.iter().map(|c| (c, depth + 1)));
            }
        }
        deepest
    }

    /// Visit items whose anchor lies in `rect` (edges included).
    ///
    /// Cells are visited depth-first with children in `[NE, NW, SE, SW]`
    /// order, so results are deterministic for a given insertion sequence.
    pub fn visit_rect<F: FnMut(&Item<T, P>)>(&self, rect: Aabb2D<T>, mut f: F) {
        let mut stack = alloc::vec![&self.root];
        while let Some(cell) = stack.pop() {
            if !cell.boundary.overlaps(&rect) {
                continue;
            }
            for item in &cell.items {
                let (x, y) = item.aabb.center();
                if rect.contains_point(x, y) {
                    f(item);
                }
            }
            if let Some(children) = &cell.children {
                // Reversed so NE is popped first.
                stack.extend(children.iter().rev());
            }
        }
    }

    /// Query payloads of items whose anchor lies in `rect`.
    pub fn query_rect(&self, rect: Aabb2D<T>) -> impl Iterator<Item = P> + '_ {
        let mut out = Vec::new();
        self.visit_rect(rect, |item| out.push(item.payload));
        out.into_iter()
    }

    /// Iterate every stored item in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = &Item<T, P>> + '_ {
        let mut out = Vec::with_capacity(self.len);
        let mut stack = alloc::vec![&self.root];
        while let Some(cell) = stack.pop() {
            out.extend(cell.items.iter());
            if let Some(children) = &cell.children {
                stack.extend(children.iter().rev());
            }
        }
        out.into_iter()
    }
}
