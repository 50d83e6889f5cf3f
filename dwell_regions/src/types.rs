// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the region tree: identifiers, flags, and region data.

use alloc::string::String;
use kurbo::Rect;

/// Identifier for a region in the tree (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub(crate) u32, pub(crate) u32);

impl RegionId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Region flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RegionFlags: u8 {
        /// The region is a heading rather than a container landmark.
        const HEADING = 0b0000_0001;
    }
}

/// A navigation region (menu, nav bar, tab list) as captured by a collector.
///
/// `K` is the collector's stable identity for the underlying node.
#[derive(Clone, Debug, PartialEq)]
pub struct NavArea<K> {
    /// Collector-assigned identity.
    pub key: K,
    /// Bounds in document coordinates at capture time.
    pub rect: Rect,
    /// Human-readable label.
    pub label: String,
    /// Region flags.
    pub flags: RegionFlags,
}

impl<K> NavArea<K> {
    /// Whether the region is a heading.
    pub fn is_heading(&self) -> bool {
        self.flags.contains(RegionFlags::HEADING)
    }
}
