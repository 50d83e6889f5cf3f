// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host document abstraction.
//!
//! The engine never touches a concrete DOM. Hosts implement [`Document`] over
//! whatever tree and layout API they have, and hand the engine opaque node
//! handles. [`MemoryDocument`] is a small in-memory implementation used by
//! tests and the demos.

use core::fmt::Debug;
use core::hash::Hash;

use kurbo::{Point, Rect, Size, Vec2};

use crate::change::{ChangeSource, MutationKind, MutationRecord, ObserveOptions};

bitflags::bitflags! {
    /// Computed style bits that hide a node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u8 {
        /// `display: none`; the node and its subtree are not rendered.
        const DISPLAY_NONE = 0b0000_0001;
        /// `visibility: hidden`; the node is invisible but its descendants may not be.
        const VISIBILITY_HIDDEN = 0b0000_0010;
    }
}

/// The visible part of the document.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Scroll offset: the document coordinate of the viewport's top-left corner.
    pub scroll: Vec2,
    /// Viewport size.
    pub size: Size,
}

impl Viewport {
    /// The viewport as a rectangle in document coordinates.
    pub fn document_rect(&self) -> Rect {
        Rect::from_origin_size(self.scroll.to_point(), self.size)
    }

    /// The viewport as a rectangle in client coordinates.
    pub fn client_rect(&self) -> Rect {
        Rect::from_origin_size(Point::ZERO, self.size)
    }

    /// Convert a client (viewport-relative) rectangle to document coordinates.
    pub fn to_document(&self, r: Rect) -> Rect {
        r + self.scroll
    }

    /// Convert a client point to document coordinates.
    pub fn point_to_document(&self, p: Point) -> Point {
        p + self.scroll
    }

    /// Convert a document point to client coordinates.
    pub fn point_to_client(&self, p: Point) -> Point {
        p - self.scroll
    }
}

/// Read access to a live document tree with layout.
///
/// All rectangles returned by the document are client (viewport-relative)
/// rectangles, the way layout APIs usually report them. The engine converts
/// them to document coordinates with [`Document::viewport`].
pub trait Document {
    /// Opaque handle to a node. Handles must stay equal while the node lives.
    type Node: Copy + Eq + Hash + Debug;

    /// The root element.
    fn root(&self) -> Self::Node;

    /// Parent element, or `None` for the root and detached nodes.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Element children of `node` in document order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Lowercase tag name.
    fn tag_name(&self, node: Self::Node) -> &str;

    /// Attribute value, if present.
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// Whether `class` appears in the node's class list.
    fn has_class(&self, node: Self::Node, class: &str) -> bool;

    /// Concatenated text of the node and its descendants.
    fn text_content(&self, node: Self::Node) -> String;

    /// Border box in client coordinates.
    fn client_rect(&self, node: Self::Node) -> Rect;

    /// Style bits that hide the node.
    fn render_flags(&self, node: Self::Node) -> RenderFlags;

    /// Whether the node is still attached to the document.
    fn is_connected(&self, node: Self::Node) -> bool;

    /// Topmost rendered element at a client point.
    fn node_at_client_point(&self, point: Point) -> Option<Self::Node>;

    /// Current viewport.
    fn viewport(&self) -> Viewport;

    /// Full scrollable size of the document.
    fn document_size(&self) -> Size;
}

/// Handle to a node of a [`MemoryDocument`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemNodeId(u32);

#[derive(Clone, Debug)]
struct MemNode {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    /// Document coordinates.
    rect: Rect,
    flags: RenderFlags,
    parent: Option<MemNodeId>,
    children: Vec<MemNodeId>,
}

/// An in-memory document with explicit geometry.
///
/// Node rectangles are set in document coordinates and reported through
/// [`Document::client_rect`] relative to the current scroll offset. Every
/// change made through its setters is recorded as a [`MutationRecord`] while
/// a subscription is active (see [`ChangeSource`]).
///
/// ```
/// use dwell_engine::document::{Document, MemoryDocument};
/// use kurbo::{Rect, Size};
///
/// let mut doc = MemoryDocument::new(Size::new(800.0, 600.0), Size::new(800.0, 2000.0));
/// let body = doc.root();
/// let link = doc.append(body, "a", Rect::new(10.0, 700.0, 90.0, 720.0));
/// doc.set_attribute(link, "href", "/next");
///
/// doc.scroll_to(0.0, 650.0);
/// assert_eq!(doc.client_rect(link), Rect::new(10.0, 50.0, 90.0, 70.0));
/// ```
#[derive(Clone, Debug)]
pub struct MemoryDocument {
    nodes: Vec<MemNode>,
    viewport: Viewport,
    size: Size,
    observing: Option<ObserveOptions>,
    pending: Vec<MutationRecord>,
}

impl MemoryDocument {
    /// Create a document with an empty `body` root covering `document_size`.
    pub fn new(viewport_size: Size, document_size: Size) -> Self {
        let root = MemNode {
            tag: "body".into(),
            attributes: Vec::new(),
            text: String::new(),
            rect: Rect::from_origin_size(Point::ZERO, document_size),
            flags: RenderFlags::empty(),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            viewport: Viewport {
                scroll: Vec2::ZERO,
                size: viewport_size,
            },
            size: document_size,
            observing: None,
            pending: Vec::new(),
        }
    }

    /// Append a new element under `parent` with a document-space rectangle.
    pub fn append(&mut self, parent: MemNodeId, tag: &str, rect: Rect) -> MemNodeId {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "test documents stay far below u32::MAX nodes"
        )]
        let id = MemNodeId(self.nodes.len() as u32);
        self.nodes.push(MemNode {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            text: String::new(),
            rect,
            flags: RenderFlags::empty(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0 as usize].children.push(id);
        self.record(parent, MutationKind::ChildList, None);
        id
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, node: MemNodeId, name: &str, value: &str) {
        let attrs = &mut self.nodes[node.0 as usize].attributes;
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.into(),
            None => attrs.push((name.into(), value.into())),
        }
        self.record(node, MutationKind::Attributes, Some(name));
    }

    /// Remove an attribute.
    pub fn remove_attribute(&mut self, node: MemNodeId, name: &str) {
        self.nodes[node.0 as usize]
            .attributes
            .retain(|(n, _)| n != name);
        self.record(node, MutationKind::Attributes, Some(name));
    }

    /// Add a class to the node's class list.
    pub fn add_class(&mut self, node: MemNodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let joined = match self.attribute(node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{existing} {class}"),
            _ => class.to_owned(),
        };
        self.set_attribute(node, "class", &joined);
    }

    /// Set the node's own text.
    pub fn set_text(&mut self, node: MemNodeId, text: &str) {
        self.nodes[node.0 as usize].text = text.into();
        self.record(node, MutationKind::ChildList, None);
    }

    /// Move or resize the node. Layout changes are not DOM mutations and are
    /// not recorded.
    pub fn set_rect(&mut self, node: MemNodeId, rect: Rect) {
        self.nodes[node.0 as usize].rect = rect;
    }

    /// Change the node's computed style bits.
    pub fn set_render_flags(&mut self, node: MemNodeId, flags: RenderFlags) {
        self.nodes[node.0 as usize].flags = flags;
        self.record(node, MutationKind::Attributes, Some("style"));
    }

    /// Detach the node (and its subtree) from the document.
    pub fn remove(&mut self, node: MemNodeId) {
        let Some(parent) = self.nodes[node.0 as usize].parent.take() else {
            return;
        };
        self.nodes[parent.0 as usize].children.retain(|c| *c != node);
        self.record(parent, MutationKind::ChildList, None);
    }

    /// Scroll so that the viewport's top-left corner is at `(x, y)`.
    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.viewport.scroll = Vec2::new(x, y);
    }

    /// Document-space rectangle of a node.
    pub fn document_rect(&self, node: MemNodeId) -> Rect {
        self.nodes[node.0 as usize].rect
    }

    fn record(&mut self, target: MemNodeId, kind: MutationKind, attribute: Option<&str>) {
        let Some(options) = self.observing else {
            return;
        };
        let wanted = match kind {
            MutationKind::Attributes => options.attributes,
            MutationKind::ChildList => options.child_list,
        };
        if !wanted || (!options.subtree && target != self.root()) {
            return;
        }
        let node = &self.nodes[target.0 as usize];
        let attr = |name: &str| {
            node.attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        };
        let record = MutationRecord {
            kind,
            attribute_name: attribute.map(str::to_owned),
            target_id: attr("id"),
            target_classes: attr("class")
                .map(|c| c.split_whitespace().map(str::to_owned).collect())
                .unwrap_or_default(),
        };
        self.pending.push(record);
    }

    fn node(&self, id: MemNodeId) -> &MemNode {
        &self.nodes[id.0 as usize]
    }

    fn rendered(&self, id: MemNodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if self.node(n).flags.contains(RenderFlags::DISPLAY_NONE) {
                return false;
            }
            cur = self.node(n).parent;
        }
        !self.node(id).flags.contains(RenderFlags::VISIBILITY_HIDDEN)
    }
}

impl Document for MemoryDocument {
    type Node = MemNodeId;

    fn root(&self) -> MemNodeId {
        MemNodeId(0)
    }

    fn parent(&self, node: MemNodeId) -> Option<MemNodeId> {
        self.node(node).parent
    }

    fn children(&self, node: MemNodeId) -> Vec<MemNodeId> {
        self.node(node).children.clone()
    }

    fn tag_name(&self, node: MemNodeId) -> &str {
        &self.node(node).tag
    }

    fn attribute(&self, node: MemNodeId, name: &str) -> Option<&str> {
        self.node(node)
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn has_class(&self, node: MemNodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    fn text_content(&self, node: MemNodeId) -> String {
        let mut out = self.node(node).text.clone();
        for child in &self.node(node).children {
            let text = self.text_content(*child);
            if !text.is_empty() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&text);
            }
        }
        out
    }

    fn client_rect(&self, node: MemNodeId) -> Rect {
        self.node(node).rect - self.viewport.scroll
    }

    fn render_flags(&self, node: MemNodeId) -> RenderFlags {
        self.node(node).flags
    }

    fn is_connected(&self, node: MemNodeId) -> bool {
        let mut cur = node;
        loop {
            if cur == self.root() {
                return true;
            }
            match self.nodes.get(cur.0 as usize).and_then(|n| n.parent) {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    fn node_at_client_point(&self, point: Point) -> Option<MemNodeId> {
        let p = self.viewport.point_to_document(point);
        // Later siblings and deeper nodes paint on top.
        let mut hit = None;
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if node.flags.contains(RenderFlags::DISPLAY_NONE) {
                continue;
            }
            if self.rendered(id) && node.rect.contains(p) {
                hit = Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        hit
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn document_size(&self) -> Size {
        self.size
    }
}

impl ChangeSource for MemoryDocument {
    fn subscribe(&mut self, options: ObserveOptions) {
        self.observing = Some(options);
    }

    fn unsubscribe(&mut self) {
        self.observing = None;
        self.pending.clear();
    }

    fn take_batch(&mut self) -> Vec<MutationRecord> {
        core::mem::take(&mut self.pending)
    }
}
