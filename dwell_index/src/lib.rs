// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dwell Index: the geometry index behind pointer-dwell target resolution.
//!
//! - [`Aabb2D`]: an axis-aligned box with one explicit convention (min/max
//!   corners, built from top-left + size).
//! - [`QuadTree`]: a capacity-bounded point-region quadtree that places each
//!   item by the center of its box and answers rectangle range queries.
//!
//! It is generic over the scalar type `T` and does not depend on any geometry crate.
//! Higher layers (like a page collector) compute document-space boxes and feed them here.
//!
//! The tree is rebuilt rather than patched: build a fresh [`QuadTree`] over the
//! full item set whenever geometry changes and swap it in for the old one.
//!
//! # Example
//!
//! ```rust
//! use dwell_index::{Aabb2D, QuadTree};
//!
//! let items = [
//!     (Aabb2D::from_xywh(0.0, 0.0, 10.0, 10.0), 1_u32),
//!     (Aabb2D::from_xywh(100.0, 100.0, 10.0, 10.0), 2),
//!     (Aabb2D::from_xywh(900.0, 0.0, 10.0, 10.0), 3),
//! ];
//! let (tree, rejected) = QuadTree::build(Aabb2D::new(0.0, 0.0, 500.0, 500.0), 8, items);
//!
//! // Item 3 is outside the boundary and is handed back instead of stored.
//! assert_eq!(rejected.len(), 1);
//! assert_eq!(rejected[0].payload, 3);
//!
//! let hits: Vec<_> = tree.query_rect(Aabb2D::from_xywh(0.0, 0.0, 20.0, 20.0)).collect();
//! assert_eq!(hits, vec![1]);
//! ```
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for floating-point coordinates. Debug builds may assert.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod quadtree;
mod types;

pub use quadtree::{DEFAULT_MAX_DEPTH, InsertError, Item, QuadTree};
pub use types::{Aabb2D, Scalar};
