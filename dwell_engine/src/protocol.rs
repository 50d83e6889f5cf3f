// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Message contract between the engine and its host.
//!
//! Messages are JSON objects tagged by a `"type"` field with kebab-case names,
//! so any transport that carries named JSON events can carry them.
//!
//! ```
//! use dwell_engine::protocol::Inbound;
//!
//! let msg = Inbound::decode(r#"{ "type": "pointer-sample", "x": 120.0, "y": 48.5 }"#).unwrap();
//! assert_eq!(msg, Inbound::PointerSample { x: 120.0, y: 48.5 });
//! ```

use std::collections::BTreeMap;

use dwell_regions::{RegionId, RegionTree};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

use crate::change::MutationRecord;
use crate::collector::{ElementId, InteractiveElement};
use crate::config::EngineConfig;
use crate::error::ProtocolError;

/// Why the index was rebuilt.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RebuildReason {
    /// The host asked for it.
    Requested,
    /// Document mutations settled.
    Mutation,
    /// Scrolling settled.
    Scroll,
    /// A new configuration changed what gets collected.
    Configured,
}

/// What confirming a target should do.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Simulate a click.
    Click,
    /// Focus for text entry (opens the on-screen keyboard).
    Edit,
    /// Open the option picker of a `<select>`.
    Select,
    /// Trigger a host UI control.
    Activate,
}

impl Action {
    /// Action for confirming a page element.
    pub fn for_element(element: &InteractiveElement) -> Self {
        if element.editable {
            Self::Edit
        } else if element.tag == "select" {
            Self::Select
        } else {
            Self::Click
        }
    }
}

/// An activation surface with its own dwell session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Surface {
    /// The coarse pointer over the page.
    Document,
    /// A named host control surface (toolbar, keyboard).
    Control(String),
}

/// Something that can be selected and confirmed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Target {
    /// A page element.
    Element {
        /// Collector identity.
        id: ElementId,
    },
    /// A host control.
    Control {
        /// Surface the control lives on.
        surface: String,
        /// Control name.
        control: String,
    },
}

/// A rectangle as `{x, y, width, height}`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl From<Rect> for WireRect {
    fn from(r: Rect) -> Self {
        let r = r.abs();
        Self {
            x: r.x0,
            y: r.y0,
            width: r.width(),
            height: r.height(),
        }
    }
}

impl From<WireRect> for Rect {
    fn from(r: WireRect) -> Self {
        Self::new(r.x, r.y, r.x + r.width, r.y + r.height)
    }
}

/// An interactive element as sent to the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireElement {
    /// Collector identity.
    pub id: ElementId,
    /// Document rectangle.
    pub rect: WireRect,
    /// Tag name.
    pub tag: String,
    /// ARIA role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Accessible label.
    pub label: String,
    /// Accepts text input.
    pub editable: bool,
    /// Current value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Extra attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl From<&InteractiveElement> for WireElement {
    fn from(e: &InteractiveElement) -> Self {
        Self {
            id: e.id,
            rect: e.rect.into(),
            tag: e.tag.clone(),
            role: e.role.clone(),
            label: e.label.clone(),
            editable: e.editable,
            value: e.value.clone(),
            attributes: e.attributes.clone(),
        }
    }
}

/// A navigation region as sent to the host, with its nested regions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireRegion {
    /// Collector identity.
    pub id: ElementId,
    /// Document rectangle.
    pub rect: WireRect,
    /// Label.
    pub label: String,
    /// Heading rather than container.
    pub is_heading: bool,
    /// Nested regions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Self>,
}

impl WireRegion {
    /// Convert a region and its subtree.
    pub fn from_tree(tree: &RegionTree<ElementId>, id: RegionId) -> Option<Self> {
        let area = tree.get(id)?;
        Some(Self {
            id: area.key,
            rect: area.rect.into(),
            label: area.label.clone(),
            is_heading: area.is_heading(),
            children: tree
                .children_of(id)
                .iter()
                .filter_map(|c| Self::from_tree(tree, *c))
                .collect(),
        })
    }
}

/// Messages the host sends to the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Inbound {
    /// Rebuild now (document ready, navigation).
    RebuildRequested,
    /// A batch of observed mutations.
    DocumentMutated {
        /// Records in observation order.
        records: Vec<MutationRecord>,
    },
    /// The user stopped scrolling.
    ScrollSettled,
    /// The engine scrolled the page on the user's behalf.
    ScrollRequested,
    /// Pointer position in client (viewport) coordinates.
    PointerSample {
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
    },
    /// Pointer entered a host control.
    ControlEnter {
        /// Surface the control lives on.
        surface: String,
        /// Control name.
        control: String,
        /// Fire repeatedly while hovered.
        #[serde(default)]
        repeating: bool,
    },
    /// Pointer left a host control surface.
    ControlLeave {
        /// Surface left.
        surface: String,
    },
    /// A control was triggered directly (switch press, precise click).
    ControlActivate {
        /// Surface the control lives on.
        surface: String,
        /// Control name.
        control: String,
    },
    /// Confirm the element selected on the page now, without waiting for the
    /// dwell (switch press).
    Activate,
    /// The host is done with the docked region.
    Undock,
    /// Replace the configuration.
    Configure {
        /// New configuration.
        config: Box<EngineConfig>,
    },
}

impl Inbound {
    /// Decode a JSON message.
    pub fn decode(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(ProtocolError::Decode)
    }
}

/// Messages the engine sends to the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Outbound {
    /// Regions around the pointer; the engine is now docked.
    RegionsInRange {
        /// Deepest matching regions with their subtrees.
        regions: Vec<WireRegion>,
    },
    /// Elements around the pointer.
    ElementsInRange {
        /// Deduplicated elements in discovery order.
        elements: Vec<WireElement>,
    },
    /// A dwell started.
    TargetSelected {
        /// Selected target.
        target: Target,
    },
    /// A dwell completed or a control was activated.
    TargetConfirmed {
        /// Confirmed target.
        target: Target,
        /// What to do.
        action: Action,
    },
    /// A dwell was abandoned before completing.
    TargetCancelled {
        /// Abandoned target.
        target: Target,
    },
    /// A new index generation is live.
    IndexRebuilt {
        /// Elements indexed.
        elements: usize,
        /// Regions indexed.
        regions: usize,
        /// Geometry entries rejected by the index boundary.
        rejected: usize,
        /// Trigger.
        reason: RebuildReason,
    },
}

impl Outbound {
    /// Encode as JSON.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::MutationKind;
    use serde_json::json;

    #[test]
    fn inbound_names() {
        let cases = [
            (json!({ "type": "rebuild-requested" }), Inbound::RebuildRequested),
            (json!({ "type": "scroll-settled" }), Inbound::ScrollSettled),
            (json!({ "type": "scroll-requested" }), Inbound::ScrollRequested),
            (json!({ "type": "undock" }), Inbound::Undock),
            (json!({ "type": "activate" }), Inbound::Activate),
            (
                json!({ "type": "control-enter", "surface": "toolbar", "control": "zoom-in" }),
                Inbound::ControlEnter {
                    surface: "toolbar".into(),
                    control: "zoom-in".into(),
                    repeating: false,
                },
            ),
            (
                json!({ "type": "document-mutated", "records": [{ "kind": "child-list" }] }),
                Inbound::DocumentMutated {
                    records: vec![MutationRecord {
                        kind: MutationKind::ChildList,
                        attribute_name: None,
                        target_id: None,
                        target_classes: Vec::new(),
                    }],
                },
            ),
        ];
        for (value, expected) in cases {
            let decoded = Inbound::decode(&value.to_string()).unwrap();
            assert_eq!(decoded, expected);
        }
    }

    #[test]
    fn configure_accepts_partial_config() {
        let msg = Inbound::decode(
            r#"{ "type": "configure", "config": { "dwell": { "generic-ms": 1000 } } }"#,
        )
        .unwrap();
        let Inbound::Configure { config } = &msg else {
            panic!("expected configure, got {msg:?}");
        };
        assert_eq!(config.dwell.generic_ms, 1000);
        assert_eq!(config.quadtree_capacity, 8);
    }

    #[test]
    fn undecodable_inbound() {
        assert!(matches!(
            Inbound::decode(r#"{ "type": "teleport" }"#),
            Err(ProtocolError::Decode(_))
        ));
        assert!(matches!(
            Inbound::decode(r#"{ "type": "pointer-sample", "x": 1 }"#),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn outbound_shapes() {
        let confirmed = Outbound::TargetConfirmed {
            target: Target::Element { id: ElementId(4) },
            action: Action::Edit,
        };
        assert_eq!(
            serde_json::to_value(&confirmed).unwrap(),
            json!({
                "type": "target-confirmed",
                "target": { "kind": "element", "id": 4 },
                "action": "edit",
            })
        );

        let regions = Outbound::RegionsInRange {
            regions: vec![WireRegion {
                id: ElementId(1),
                rect: Rect::new(10.0, 10.0, 60.0, 30.0).into(),
                label: "Products".into(),
                is_heading: false,
                children: Vec::new(),
            }],
        };
        let encoded = regions.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "regions-in-range",
                "regions": [{
                    "id": 1,
                    "rect": { "x": 10.0, "y": 10.0, "width": 50.0, "height": 20.0 },
                    "label": "Products",
                    "is-heading": false,
                }],
            })
        );
    }

    #[test]
    fn element_actions() {
        let mut e = InteractiveElement {
            id: ElementId(0),
            rect: Rect::ZERO,
            tag: "select".into(),
            role: None,
            label: String::new(),
            editable: false,
            value: None,
            attributes: BTreeMap::new(),
        };
        assert_eq!(Action::for_element(&e), Action::Select);
        e.tag = "input".into();
        e.editable = true;
        assert_eq!(Action::for_element(&e), Action::Edit);
        e.tag = "a".into();
        e.editable = false;
        assert_eq!(Action::for_element(&e), Action::Click);
    }

    #[test]
    fn wire_rect_round_trip() {
        let r = Rect::new(1.0, 2.0, 4.0, 8.0);
        assert_eq!(Rect::from(WireRect::from(r)), r);
    }
}
