// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dwell Regions: a containment tree of navigation regions.
//!
//! Pages group their controls into coarse landmarks: navigation bars, menus,
//! tab lists, dropdown submenus. When a pointer dwells over such a region the
//! user usually means "this menu", not "the nav bar that contains it". This
//! crate keeps those regions in a tree that mirrors their document nesting and
//! answers range queries that can return only the most specific matches.
//!
//! - [`RegionTree`]: container managing regions and their nesting.
//! - [`NavArea`]: per-region data (collector key, bounds, label, flags).
//! - [`RegionFlags`]: region flags such as [`RegionFlags::HEADING`].
//! - [`RegionId`]: handle of a region, stamped with the tree's epoch.
//!
//! Key operations:
//! - [`RegionTree::insert`](RegionTree::insert) → [`RegionId`]
//! - [`RegionTree::query`](RegionTree::query) / [`RegionTree::query_point`](RegionTree::query_point)
//!   with a `deepest_only` switch.
//! - [`RegionTree::parent_of`](RegionTree::parent_of), [`RegionTree::children_of`](RegionTree::children_of),
//!   [`RegionTree::roots`](RegionTree::roots) and [`RegionTree::iter`](RegionTree::iter) for structure.
//!
//! Intersection uses [`dwell_index::Aabb2D::overlaps`], the same edge-inclusive
//! test the geometry index uses for its query rectangles.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod tree;
mod types;
mod util;

pub use tree::RegionTree;
pub use types::{NavArea, RegionFlags, RegionId};
