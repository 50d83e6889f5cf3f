// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collector: scans the document for dwell targets and owns their identity.
//!
//! A pass walks the document once, in document order, and captures:
//! - **elements**: nodes matching the interactive selectors;
//! - **regions**: nodes matching the landmark selectors, nested the way they
//!   are nested in the document.
//!
//! Only rendered nodes with a non-zero box that at least partially intersects
//! the viewport are captured. Subtrees belonging to the engine's own artifacts
//! are skipped entirely.
//!
//! Identity is kept in a map owned by the collector rather than on the nodes:
//! a node keeps its [`ElementId`] for as long as it stays connected, and ids
//! of disconnected nodes are pruned at the end of each pass.

use core::fmt;
use core::hash::Hash;
use std::collections::BTreeMap;

use hashbrown::HashMap;
use kurbo::Rect;
use serde::{Deserialize, Serialize};

use crate::change::ArtifactFilter;
use crate::config::CompiledSelectors;
use crate::document::{Document, RenderFlags};
use crate::error::LookupError;

/// Stable identity of a collected node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An interactive element captured by a pass.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractiveElement {
    /// Collector identity.
    pub id: ElementId,
    /// Border box in document coordinates at capture time.
    pub rect: Rect,
    /// Lowercase tag name.
    pub tag: String,
    /// ARIA role, if set.
    pub role: Option<String>,
    /// Accessible label.
    pub label: String,
    /// Accepts text input.
    pub editable: bool,
    /// Current `value` attribute.
    pub value: Option<String>,
    /// Other attributes worth showing to the user.
    pub attributes: BTreeMap<String, String>,
}

/// A navigation region captured by a pass.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectedRegion {
    /// Collector identity.
    pub id: ElementId,
    /// Index of the enclosing region in [`Collection::regions`].
    pub parent: Option<usize>,
    /// Border box in document coordinates at capture time.
    pub rect: Rect,
    /// Accessible label.
    pub label: String,
    /// A heading rather than a container landmark.
    pub heading: bool,
}

/// Output of one collection pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    /// Interactive elements in document order.
    pub elements: Vec<InteractiveElement>,
    /// Regions in document order; parents precede their children.
    pub regions: Vec<CollectedRegion>,
}

const EXTRA_ATTRIBUTES: &[&str] = &["href", "type", "name", "placeholder", "title", "alt"];

const TEXT_INPUT_TYPES: &[&str] = &[
    "text", "search", "email", "url", "tel", "password", "number",
];

#[derive(Clone, Debug)]
struct Tracked<N> {
    node: N,
    /// Document rectangle at the last pass that saw the node visible.
    rect: Option<Rect>,
}

/// Finds dwell targets and maps them to stable ids.
#[derive(Clone, Debug)]
pub struct Collector<N> {
    ids: HashMap<N, ElementId>,
    nodes: HashMap<ElementId, Tracked<N>>,
    next: u32,
}

impl<N: Copy + Eq + Hash> Default for Collector<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Copy + Eq + Hash> Collector<N> {
    /// Create a collector with no known nodes.
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            nodes: HashMap::new(),
            next: 0,
        }
    }

    /// Run one pass over `doc`.
    pub fn collect<D>(
        &mut self,
        doc: &D,
        selectors: &CompiledSelectors,
        artifacts: &ArtifactFilter,
    ) -> Collection
    where
        D: Document<Node = N>,
    {
        let viewport = doc.viewport();
        let visible_area = viewport.client_rect();
        let mut out = Collection::default();

        // (node, index of the enclosing region)
        let mut stack = vec![(doc.root(), None::<usize>)];
        while let Some((node, region)) = stack.pop() {
            if artifacts.is_artifact_node(doc, node) {
                continue;
            }
            let flags = doc.render_flags(node);
            if flags.contains(RenderFlags::DISPLAY_NONE) {
                continue;
            }

            let client = doc.client_rect(node);
            let visible = !flags.contains(RenderFlags::VISIBILITY_HIDDEN)
                && client.width() > 0.0
                && client.height() > 0.0
                && overlaps(client, visible_area);

            let mut enclosing = region;
            if visible {
                let rect = viewport.to_document(client);
                if selectors.regions.matches(doc, node) {
                    let id = self.track(node, rect);
                    out.regions.push(CollectedRegion {
                        id,
                        parent: region,
                        rect,
                        label: label_of(doc, node),
                        heading: is_heading(doc, node),
                    });
                    enclosing = Some(out.regions.len() - 1);
                } else if selectors.elements.matches(doc, node) {
                    let id = self.track(node, rect);
                    out.elements.push(capture(doc, node, id, rect));
                }
            }

            let children = doc.children(node);
            stack.extend(children.into_iter().rev().map(|c| (c, enclosing)));
        }

        self.prune(doc);
        out
    }

    /// Identity of a node, if it has been collected and is still tracked.
    pub fn id_of(&self, node: N) -> Option<ElementId> {
        self.ids.get(&node).copied()
    }

    /// Last document rectangle recorded for `id`.
    pub fn last_rect(&self, id: ElementId) -> Option<Rect> {
        self.nodes.get(&id).and_then(|t| t.rect)
    }

    /// Number of tracked nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node is tracked.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve an id to a live node.
    ///
    /// If the tracked node has been detached since the last pass, fall back to
    /// the interactive element rendered at the centre of its last known
    /// rectangle: the node hit there, or its nearest ancestor, that matches
    /// the element selectors and is not an engine artifact. Containers such
    /// as `body` never stand in for a removed element.
    pub fn lookup<D>(
        &self,
        doc: &D,
        id: ElementId,
        selectors: &CompiledSelectors,
        artifacts: &ArtifactFilter,
    ) -> Result<N, LookupError>
    where
        D: Document<Node = N>,
    {
        let tracked = self.nodes.get(&id).ok_or(LookupError::Unknown(id))?;
        if doc.is_connected(tracked.node) {
            return Ok(tracked.node);
        }
        let rect = tracked.rect.ok_or(LookupError::Detached(id))?;
        let client = doc.viewport().point_to_client(rect.center());
        let mut cur = doc.node_at_client_point(client);
        while let Some(node) = cur {
            if selectors.elements.matches(doc, node) && !artifacts.is_artifact_node(doc, node) {
                return Ok(node);
            }
            cur = doc.parent(node);
        }
        Err(LookupError::Detached(id))
    }

    fn track(&mut self, node: N, rect: Rect) -> ElementId {
        let id = match self.ids.get(&node) {
            Some(id) => *id,
            None => {
                let id = ElementId(self.next);
                self.next = self.next.wrapping_add(1);
                self.ids.insert(node, id);
                id
            }
        };
        self.nodes
            .entry(id)
            .and_modify(|t| t.rect = Some(rect))
            .or_insert(Tracked {
                node,
                rect: Some(rect),
            });
        id
    }

    fn prune<D: Document<Node = N>>(&mut self, doc: &D) {
        self.ids.retain(|node, _| doc.is_connected(*node));
        let ids = &self.ids;
        self.nodes.retain(|_, t| ids.contains_key(&t.node));
    }
}

/// Closed overlap; a box touching the viewport edge counts as inside.
fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

fn capture<D: Document>(doc: &D, node: D::Node, id: ElementId, rect: Rect) -> InteractiveElement {
    let attributes = EXTRA_ATTRIBUTES
        .iter()
        .filter_map(|name| {
            doc.attribute(node, name)
                .map(|v| ((*name).to_owned(), v.to_owned()))
        })
        .collect();
    InteractiveElement {
        id,
        rect,
        tag: doc.tag_name(node).to_owned(),
        role: doc.attribute(node, "role").map(str::to_owned),
        label: label_of(doc, node),
        editable: is_editable(doc, node),
        value: doc.attribute(node, "value").map(str::to_owned),
        attributes,
    }
}

fn is_editable<D: Document>(doc: &D, node: D::Node) -> bool {
    if doc
        .attribute(node, "contenteditable")
        .is_some_and(|v| !v.eq_ignore_ascii_case("false"))
    {
        return true;
    }
    if matches!(doc.attribute(node, "role"), Some("textbox" | "searchbox")) {
        return true;
    }
    match doc.tag_name(node) {
        "textarea" => true,
        "input" => {
            let ty = doc.attribute(node, "type").unwrap_or("text");
            TEXT_INPUT_TYPES.iter().any(|t| t.eq_ignore_ascii_case(ty))
        }
        _ => false,
    }
}

fn is_heading<D: Document>(doc: &D, node: D::Node) -> bool {
    matches!(doc.tag_name(node), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
        || doc.attribute(node, "role") == Some("heading")
}

/// First non-empty of: `aria-label`, `title`, text content, `placeholder`,
/// `value`, `alt`. Whitespace is collapsed.
fn label_of<D: Document>(doc: &D, node: D::Node) -> String {
    let text = doc.text_content(node);
    let candidates = [
        doc.attribute(node, "aria-label"),
        doc.attribute(node, "title"),
        Some(text.as_str()),
        doc.attribute(node, "placeholder"),
        doc.attribute(node, "value"),
        doc.attribute(node, "alt"),
    ];
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}
