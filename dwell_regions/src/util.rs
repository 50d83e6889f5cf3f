// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use dwell_index::Aabb2D;
use kurbo::Rect;

/// Convert a `Rect` to the index's AABB, normalizing inverted rectangles.
pub(crate) fn rect_to_aabb(r: Rect) -> Aabb2D<f64> {
    let r = r.abs();
    Aabb2D::new(r.x0, r.y0, r.x1, r.y1)
}
