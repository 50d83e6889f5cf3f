// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Candidate resolution around a pointer position.
//!
//! Resolution is a pure function of one [`IndexSnapshot`] and a point:
//!
//! 1. Build a query window of the configured range, centered on the point.
//! 2. Query the region tree, deepest matches only. Any hit wins outright and
//!    elements are not queried.
//! 3. Otherwise query the geometry index and keep the first entry per
//!    [`ElementId`], since large elements are indexed as several tiles.

use hashbrown::HashSet;
use kurbo::{Point, Rect, Size};

use crate::collector::{ElementId, InteractiveElement};
use crate::snapshot::IndexSnapshot;
use dwell_regions::RegionId;

/// Candidates found around one pointer position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Candidates {
    /// Deepest regions in range, in document order.
    pub regions: Vec<RegionId>,
    /// Elements in range, first-seen order, one entry per id.
    pub elements: Vec<ElementId>,
}

impl Candidates {
    /// Whether nothing is in range.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.elements.is_empty()
    }
}

/// Query window of `range` centered on `center`.
pub fn query_window(center: Point, range: Size) -> Rect {
    Rect::from_center_size(center, range)
}

/// Resolve candidates around `center` (document coordinates).
pub fn resolve(snapshot: &IndexSnapshot, center: Point, range: Size) -> Candidates {
    let window = query_window(center, range);

    let regions = snapshot.regions().query(window, true);
    if !regions.is_empty() {
        return Candidates {
            regions,
            elements: Vec::new(),
        };
    }

    let elements = dedup_by_id(snapshot.query_elements(window).map(|e| e.id));
    Candidates {
        regions: Vec::new(),
        elements,
    }
}

/// Keep the first occurrence of each id, preserving order.
pub fn dedup_by_id<I: IntoIterator<Item = ElementId>>(ids: I) -> Vec<ElementId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// The element whose centre is nearest `center`; ties keep the earlier one.
pub fn primary<'a>(
    snapshot: &'a IndexSnapshot,
    candidates: &Candidates,
    center: Point,
) -> Option<&'a InteractiveElement> {
    let mut best: Option<(&InteractiveElement, f64)> = None;
    for id in &candidates.elements {
        let Some(element) = snapshot.element(*id) else {
            continue;
        };
        let d = element.rect.center().distance_squared(center);
        if best.is_none_or(|(_, b)| d < b) {
            best = Some((element, d));
        }
    }
    best.map(|(e, _)| e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{CollectedRegion, Collection};
    use std::collections::BTreeMap;

    fn element(id: u32, rect: Rect) -> InteractiveElement {
        InteractiveElement {
            id: ElementId(id),
            rect,
            tag: "a".into(),
            role: None,
            label: String::new(),
            editable: false,
            value: None,
            attributes: BTreeMap::new(),
        }
    }

    fn region(id: u32, parent: Option<usize>, rect: Rect) -> CollectedRegion {
        CollectedRegion {
            id: ElementId(id),
            parent,
            rect,
            label: String::new(),
            heading: false,
        }
    }

    fn snapshot(collection: Collection) -> IndexSnapshot {
        IndexSnapshot::build(
            1,
            collection,
            Rect::new(0.0, 0.0, 1000.0, 1000.0),
            Size::new(60.0, 60.0),
            4,
        )
    }

    #[test]
    fn regions_take_priority() {
        let snap = snapshot(Collection {
            elements: vec![element(1, Rect::new(20.0, 20.0, 40.0, 30.0))],
            regions: vec![
                region(10, None, Rect::new(0.0, 0.0, 200.0, 50.0)),
                region(11, Some(0), Rect::new(10.0, 10.0, 60.0, 30.0)),
            ],
        });
        let found = resolve(&snap, Point::new(30.0, 20.0), Size::new(10.0, 10.0));
        assert!(found.elements.is_empty());
        assert_eq!(found.regions.len(), 1);
        let area = snap.regions().get(found.regions[0]).unwrap();
        assert_eq!(area.key, ElementId(11));
    }

    #[test]
    fn elements_when_no_region() {
        let snap = snapshot(Collection {
            elements: vec![
                element(1, Rect::new(0.0, 0.0, 10.0, 10.0)),
                element(2, Rect::new(100.0, 100.0, 110.0, 110.0)),
            ],
            regions: vec![region(10, None, Rect::new(500.0, 500.0, 600.0, 600.0))],
        });
        let found = resolve(&snap, Point::new(10.0, 10.0), Size::new(20.0, 20.0));
        assert!(found.regions.is_empty());
        assert_eq!(found.elements, vec![ElementId(1)]);

        let nothing = resolve(&snap, Point::new(300.0, 300.0), Size::new(20.0, 20.0));
        assert!(nothing.is_empty());
    }

    #[test]
    fn large_element_reported_once() {
        // 300x40 is split into 5 tiles; a wide window sees all of them.
        let snap = snapshot(Collection {
            elements: vec![
                element(1, Rect::new(0.0, 0.0, 300.0, 40.0)),
                element(2, Rect::new(0.0, 50.0, 20.0, 70.0)),
            ],
            regions: Vec::new(),
        });
        assert_eq!(snap.tile_count(), 6);
        let found = resolve(&snap, Point::new(150.0, 40.0), Size::new(400.0, 80.0));
        assert_eq!(found.elements.len(), 2);
        assert!(found.elements.contains(&ElementId(1)));

        // A small window in the middle of the element still finds it.
        let inside = resolve(&snap, Point::new(150.0, 20.0), Size::new(60.0, 60.0));
        assert_eq!(inside.elements, vec![ElementId(1)]);
    }

    #[test]
    fn dedup_preserves_first_seen_order() {
        let ids = [3, 1, 3, 2, 1].map(ElementId);
        assert_eq!(dedup_by_id(ids), vec![ElementId(3), ElementId(1), ElementId(2)]);
    }

    #[test]
    fn primary_is_nearest_centre() {
        let snap = snapshot(Collection {
            elements: vec![
                element(1, Rect::new(0.0, 0.0, 20.0, 20.0)),
                element(2, Rect::new(30.0, 0.0, 50.0, 20.0)),
                element(3, Rect::new(60.0, 0.0, 80.0, 20.0)),
            ],
            regions: Vec::new(),
        });
        let center = Point::new(38.0, 10.0);
        let found = resolve(&snap, center, Size::new(100.0, 60.0));
        assert_eq!(found.elements.len(), 3);
        assert_eq!(primary(&snap, &found, center).map(|e| e.id), Some(ElementId(2)));

        // Equidistant: the first discovered wins.
        let tie = Candidates {
            regions: Vec::new(),
            elements: vec![ElementId(3), ElementId(1)],
        };
        assert_eq!(
            primary(&snap, &tie, Point::new(40.0, 10.0)).map(|e| e.id),
            Some(ElementId(3))
        );
        assert!(primary(&snap, &Candidates::default(), center).is_none());
    }
}
