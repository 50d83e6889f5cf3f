// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable index snapshots.
//!
//! A snapshot pairs the geometry index over elements with the region tree,
//! both built from one [`Collection`]. It is constructed locally and then
//! swapped in whole, so readers always see one consistent generation.

use dwell_index::{Aabb2D, QuadTree};
use dwell_regions::{NavArea, RegionFlags, RegionId, RegionTree};
use hashbrown::HashMap;
use kurbo::{Rect, Size};

use crate::collector::{Collection, ElementId, InteractiveElement};

/// Upper bound on tiles along one axis of a single element.
pub const MAX_TILES_PER_AXIS: usize = 64;

/// Geometry and region indices for one collection pass.
#[derive(Debug)]
pub struct IndexSnapshot {
    generation: u32,
    boundary: Rect,
    elements: Vec<InteractiveElement>,
    by_id: HashMap<ElementId, usize>,
    geometry: QuadTree<f64, u32>,
    regions: RegionTree<ElementId>,
    rejected: usize,
}

impl IndexSnapshot {
    /// An empty snapshot covering `boundary`.
    pub fn empty(boundary: Rect) -> Self {
        Self::build(0, Collection::default(), boundary, Size::new(1.0, 1.0), 1)
    }

    /// Build both indices from a collection.
    ///
    /// Every element is split into tiles no larger than `tile` (see
    /// [`tiles`]) so that a query window lying inside a large element still
    /// contains at least one of its anchors. Tiles whose anchor falls outside
    /// `boundary` are rejected and counted; the rest of the element stays
    /// queryable.
    pub fn build(
        generation: u32,
        collection: Collection,
        boundary: Rect,
        tile: Size,
        capacity: usize,
    ) -> Self {
        let boundary = non_empty(boundary);
        let aabb = to_aabb(boundary);

        let mut entries = Vec::new();
        for (idx, element) in collection.elements.iter().enumerate() {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "element counts are far below u32::MAX"
            )]
            let slot = idx as u32;
            entries.extend(tiles(element.rect, tile).map(|r| (to_aabb(r), slot)));
        }
        let (geometry, rejected) = QuadTree::build(aabb, capacity, entries);

        let by_id = collection
            .elements
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.id, idx))
            .collect();

        let mut regions = RegionTree::with_epoch(generation);
        let mut placed: Vec<RegionId> = Vec::with_capacity(collection.regions.len());
        for region in collection.regions {
            let parent = region.parent.and_then(|p| placed.get(p).copied());
            let mut flags = RegionFlags::empty();
            flags.set(RegionFlags::HEADING, region.heading);
            let id = regions.insert(
                parent,
                NavArea {
                    key: region.id,
                    rect: region.rect,
                    label: region.label,
                    flags,
                },
            );
            placed.push(id);
        }

        Self {
            generation,
            boundary,
            elements: collection.elements,
            by_id,
            geometry,
            regions,
            rejected: rejected.len(),
        }
    }

    /// Build counter this snapshot was created with.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Root boundary of the geometry index.
    pub fn boundary(&self) -> Rect {
        self.boundary
    }

    /// Elements in document order.
    pub fn elements(&self) -> &[InteractiveElement] {
        &self.elements
    }

    /// Element by id.
    pub fn element(&self, id: ElementId) -> Option<&InteractiveElement> {
        self.by_id.get(&id).map(|idx| &self.elements[*idx])
    }

    /// Region tree.
    pub fn regions(&self) -> &RegionTree<ElementId> {
        &self.regions
    }

    /// Number of tiles rejected by the geometry index.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Number of geometry entries stored.
    pub fn tile_count(&self) -> usize {
        self.geometry.len()
    }

    /// Elements with an anchor inside `range`, in index order, possibly repeated.
    pub(crate) fn query_elements(&self, range: Rect) -> impl Iterator<Item = &InteractiveElement> + '_ {
        self.geometry
            .query_rect(to_aabb(range))
            .map(|slot| &self.elements[slot as usize])
    }
}

/// Split `rect` into an even grid of tiles no larger than `max`.
///
/// Small rectangles yield themselves. Each axis is capped at
/// [`MAX_TILES_PER_AXIS`] tiles, past which tiles grow beyond `max`.
pub fn tiles(rect: Rect, max: Size) -> impl Iterator<Item = Rect> {
    let rect = rect.abs();
    let count = |len: f64, max: f64| -> usize {
        if max <= 0.0 || len <= max {
            return 1;
        }
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "len / max is positive and clamped below"
        )]
        let n = (len / max).ceil().min(MAX_TILES_PER_AXIS as f64) as usize;
        n.max(1)
    };
    let nx = count(rect.width(), max.width);
    let ny = count(rect.height(), max.height);
    let w = rect.width() / nx as f64;
    let h = rect.height() / ny as f64;
    (0..ny).flat_map(move |j| {
        (0..nx).map(move |i| {
            let x0 = rect.x0 + w * i as f64;
            let y0 = rect.y0 + h * j as f64;
            Rect::new(x0, y0, x0 + w, y0 + h)
        })
    })
}

pub(crate) fn to_aabb(r: Rect) -> Aabb2D<f64> {
    let r = r.abs();
    Aabb2D::new(r.x0, r.y0, r.x1, r.y1)
}

fn non_empty(r: Rect) -> Rect {
    let r = r.abs();
    Rect::new(r.x0, r.y0, r.x1.max(r.x0 + 1.0), r.y1.max(r.y0 + 1.0))
}
