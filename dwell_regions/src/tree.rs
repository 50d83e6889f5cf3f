// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure and range queries.

use alloc::vec::Vec;
use core::fmt::Debug;
use kurbo::{Point, Rect};

use crate::types::{NavArea, RegionId};
use crate::util::rect_to_aabb;

/// Containment tree over navigation regions.
///
/// The tree is built once per collection pass: regions are inserted in
/// document order, each under the region whose subtree it was discovered in.
/// There is no removal or patching; build a new tree when the page changes.
///
/// Every tree carries an `epoch` that is baked into its [`RegionId`]s, so an
/// id kept from a previous build is never mistaken for a live region of the
/// current one.
///
/// ## Example
///
/// ```rust
/// use kurbo::{Point, Rect};
/// use dwell_regions::{NavArea, RegionFlags, RegionTree};
///
/// let mut tree = RegionTree::new();
/// let nav = tree.insert(
///     None,
///     NavArea { key: 1_u32, rect: Rect::new(0.0, 0.0, 200.0, 50.0), label: "Main".into(), flags: RegionFlags::empty() },
/// );
/// let sub = tree.insert(
///     Some(nav),
///     NavArea { key: 2, rect: Rect::new(10.0, 10.0, 60.0, 30.0), label: "Products".into(), flags: RegionFlags::empty() },
/// );
///
/// assert_eq!(tree.query_point(Point::new(20.0, 20.0), true), vec![sub]);
/// assert_eq!(tree.query_point(Point::new(20.0, 20.0), false), vec![nav, sub]);
/// ```
pub struct RegionTree<K> {
    nodes: Vec<Node<K>>,
    roots: Vec<RegionId>,
    epoch: u32,
}

#[derive(Clone, Debug)]
struct Node<K> {
    parent: Option<RegionId>,
    children: Vec<RegionId>,
    area: NavArea<K>,
}

impl<K: Debug> Debug for RegionTree<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegionTree")
            .field("regions", &self.nodes.len())
            .field("roots", &self.roots.len())
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl<K> Default for RegionTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> RegionTree<K> {
    /// Create an empty tree in epoch zero.
    pub fn new() -> Self {
        Self::with_epoch(0)
    }

    /// Create an empty tree whose ids are stamped with `epoch`.
    pub fn with_epoch(epoch: u32) -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            epoch,
        }
    }

    /// The epoch this tree's ids are stamped with.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Insert a region as a child of `parent` (or as a root if `None`).
    ///
    /// A `parent` that is not alive in this tree inserts the region as a root.
    pub fn insert(&mut self, parent: Option<RegionId>, area: NavArea<K>) -> RegionId {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "RegionId uses 32-bit indices."
        )]
        let id = RegionId::new(self.nodes.len() as u32, self.epoch);
        let parent = parent.filter(|p| {
            let alive = self.is_alive(*p);
            debug_assert!(alive, "parent region {p:?} is not alive in this tree");
            alive
        });
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            area,
        });
        match parent {
            Some(p) => self.nodes[p.idx()].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Returns true if `id` refers to a region of this tree.
    pub fn is_alive(&self, id: RegionId) -> bool {
        id.1 == self.epoch && id.idx() < self.nodes.len()
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no regions.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Region data for a live id.
    pub fn get(&self, id: RegionId) -> Option<&NavArea<K>> {
        self.node(id).map(|n| &n.area)
    }

    /// Returns the parent of a region if live, or `None` for roots or stale ids.
    pub fn parent_of(&self, id: RegionId) -> Option<RegionId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Get the children of a region, or empty slice if the id is stale.
    pub fn children_of(&self, id: RegionId) -> &[RegionId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Top-level regions in document order.
    pub fn roots(&self) -> &[RegionId] {
        &self.roots
    }

    /// Iterate all region ids in depth-first document order.
    pub fn iter(&self) -> impl Iterator<Item = RegionId> + '_ {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<RegionId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children_of(id).iter().rev().copied());
        }
        out.into_iter()
    }

    /// Regions whose bounds intersect `range`, in depth-first document order.
    ///
    /// Edges are inclusive: a region sharing only an edge with `range` matches.
    /// With `deepest_only`, a matching region is dropped when any of its
    /// descendants also matches, so the result never holds both a region and
    /// one of its ancestors.
    ///
    /// Every region is tested, not only descendants of matching regions,
    /// because a child may extend past its parent's bounds.
    pub fn query(&self, range: Rect, deepest_only: bool) -> Vec<RegionId> {
        let range = rect_to_aabb(range);
        let mut out = Vec::new();
        for &root in &self.roots {
            self.collect(root, &range, deepest_only, &mut out);
        }
        out
    }

    /// [`query`](Self::query) with a zero-sized range at `point`.
    pub fn query_point(&self, point: Point, deepest_only: bool) -> Vec<RegionId> {
        self.query(Rect::from_points(point, point), deepest_only)
    }

    /// Returns whether `id` or any descendant matched.
    fn collect(
        &self,
        id: RegionId,
        range: &dwell_index::Aabb2D<f64>,
        deepest_only: bool,
        out: &mut Vec<RegionId>,
    ) -> bool {
        let node = &self.nodes[id.idx()];
        let hit = rect_to_aabb(node.area.rect).overlaps(range);
        let slot = out.len();
        if hit {
            out.push(id);
        }
        let mut below = false;
        for &child in &node.children {
            below |= self.collect(child, range, deepest_only, out);
        }
        if deepest_only && hit && below {
            out.remove(slot);
        }
        hit || below
    }

    fn node(&self, id: RegionId) -> Option<&Node<K>> {
        if !self.is_alive(id) {
            return None;
        }
        self.nodes.get(id.idx())
    }
}

impl<K: PartialEq> RegionTree<K> {
    /// Find the region captured from the node with collector identity `key`.
    pub fn find_by_key(&self, key: &K) -> Option<RegionId> {
        let idx = self.nodes.iter().position(|n| n.area.key == *key)?;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "RegionId uses 32-bit indices."
        )]
        let id = RegionId::new(idx as u32, self.epoch);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RegionFlags;
    use alloc::string::ToString;
    use alloc::vec;

    fn area(key: u32, x: f64, y: f64, w: f64, h: f64) -> NavArea<u32> {
        NavArea {
            key,
            rect: Rect::from_origin_size((x, y), (w, h)),
            label: key.to_string(),
            flags: RegionFlags::empty(),
        }
    }

    #[test]
    fn submenu_resolves_before_nav_bar() {
        let mut tree = RegionTree::new();
        let nav = tree.insert(None, area(1, 0.0, 0.0, 200.0, 50.0));
        let sub = tree.insert(Some(nav), area(2, 10.0, 10.0, 50.0, 20.0));

        let p = Point::new(30.0, 20.0);
        assert_eq!(tree.query_point(p, true), vec![sub]);
        assert_eq!(tree.query_point(p, false), vec![nav, sub]);

        // Outside the submenu only the bar matches.
        let q = Point::new(150.0, 40.0);
        assert_eq!(tree.query_point(q, true), vec![nav]);
    }

    #[test]
    fn deepest_keeps_sibling_leaves() {
        let mut tree = RegionTree::new();
        let bar = tree.insert(None, area(1, 0.0, 0.0, 300.0, 100.0));
        let a = tree.insert(Some(bar), area(2, 0.0, 0.0, 100.0, 100.0));
        let b = tree.insert(Some(bar), area(3, 100.0, 0.0, 100.0, 100.0));
        let _c = tree.insert(Some(bar), area(4, 200.0, 0.0, 100.0, 100.0));

        let range = Rect::new(90.0, 40.0, 110.0, 60.0);
        assert_eq!(tree.query(range, true), vec![a, b]);
        assert_eq!(tree.query(range, false).len(), 3);
    }

    #[test]
    fn child_outside_parent_still_matches() {
        let mut tree = RegionTree::new();
        let bar = tree.insert(None, area(1, 0.0, 0.0, 100.0, 40.0));
        let dropdown = tree.insert(Some(bar), area(2, 0.0, 40.0, 100.0, 200.0));

        assert_eq!(tree.query_point(Point::new(50.0, 150.0), true), vec![dropdown]);
        assert_eq!(tree.query_point(Point::new(50.0, 150.0), false), vec![dropdown]);
    }

    #[test]
    fn disjoint_range_is_empty() {
        let mut tree = RegionTree::new();
        let nav = tree.insert(None, area(1, 0.0, 0.0, 200.0, 50.0));
        tree.insert(Some(nav), area(2, 10.0, 10.0, 50.0, 20.0));
        assert!(tree.query(Rect::new(300.0, 300.0, 320.0, 320.0), false).is_empty());
        assert!(RegionTree::<u32>::new().query_point(Point::ZERO, true).is_empty());
    }

    #[test]
    fn ids_from_other_epochs_are_stale() {
        let mut old = RegionTree::with_epoch(1);
        let stale = old.insert(None, area(7, 0.0, 0.0, 10.0, 10.0));

        let mut fresh = RegionTree::with_epoch(2);
        let live = fresh.insert(None, area(7, 0.0, 0.0, 10.0, 10.0));

        assert!(!fresh.is_alive(stale));
        assert!(fresh.get(stale).is_none());
        assert_eq!(fresh.children_of(stale), &[] as &[RegionId]);
        assert_eq!(fresh.find_by_key(&7), Some(live));
    }

    #[test]
    fn structure_accessors() {
        let mut tree = RegionTree::new();
        let a = tree.insert(None, area(1, 0.0, 0.0, 10.0, 10.0));
        let a1 = tree.insert(Some(a), area(2, 0.0, 0.0, 5.0, 5.0));
        let a2 = tree.insert(Some(a), area(3, 5.0, 0.0, 5.0, 5.0));
        let b = tree.insert(None, area(4, 20.0, 0.0, 10.0, 10.0));
        let a1x = tree.insert(Some(a1), area(5, 0.0, 0.0, 2.0, 2.0));

        assert_eq!(tree.len(), 5);
        assert_eq!(tree.roots(), &[a, b]);
        assert_eq!(tree.children_of(a), &[a1, a2]);
        assert_eq!(tree.parent_of(a1x), Some(a1));
        assert_eq!(tree.parent_of(a), None);
        assert_eq!(tree.iter().collect::<Vec<_>>(), vec![a, a1, a1x, a2, b]);
        assert_eq!(tree.get(a2).map(|n| n.key), Some(3));
    }

    #[test]
    fn heading_flag() {
        let mut heading = area(1, 0.0, 0.0, 10.0, 10.0);
        assert!(!heading.is_heading());
        heading.flags |= RegionFlags::HEADING;
        assert!(heading.is_heading());
    }
}
