// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notification from the host document.
//!
//! Hosts report subtree mutations in coalesced batches. The engine only needs
//! to know that *something* changed and whether the change was caused by the
//! engine's own artifacts (its cursor and highlight markers), so a record
//! carries just enough of the target to tell.

use serde::{Deserialize, Serialize};

use crate::config::ArtifactConfig;
use crate::document::Document;

/// What kind of change a record describes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutationKind {
    /// An attribute of the target changed.
    Attributes,
    /// Children or text of the target changed.
    ChildList,
}

/// One observed mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MutationRecord {
    /// Kind of change.
    pub kind: MutationKind,
    /// Changed attribute, for attribute records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_name: Option<String>,
    /// `id` attribute of the target node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    /// Class list of the target node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_classes: Vec<String>,
}

/// Which changes a subscription reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObserveOptions {
    /// Report changes anywhere below the root, not only on the root itself.
    pub subtree: bool,
    /// Report attribute changes.
    pub attributes: bool,
    /// Report child list and text changes.
    pub child_list: bool,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            subtree: true,
            attributes: true,
            child_list: true,
        }
    }
}

/// A host capability that reports document mutations.
pub trait ChangeSource {
    /// Start recording changes. Replaces any previous subscription.
    fn subscribe(&mut self, options: ObserveOptions);

    /// Stop recording and drop anything not yet taken.
    fn unsubscribe(&mut self);

    /// Take every record observed since the last call.
    fn take_batch(&mut self) -> Vec<MutationRecord>;
}

/// Recognizes nodes and mutations that belong to the engine itself.
///
/// Highlighting a candidate adds a marker class, and the cursor element moves
/// on every sample. Reacting to those would rebuild the index forever.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArtifactFilter {
    cursor_id: String,
    marker_classes: Vec<String>,
}

impl ArtifactFilter {
    /// Build from the configured artifact names.
    pub fn new(config: &ArtifactConfig) -> Self {
        Self {
            cursor_id: config.cursor_id.clone(),
            marker_classes: config.marker_classes.clone(),
        }
    }

    /// Whether a mutation was caused by the engine's own artifacts.
    pub fn is_artifact(&self, record: &MutationRecord) -> bool {
        if !self.cursor_id.is_empty() && record.target_id.as_deref() == Some(&*self.cursor_id) {
            return true;
        }
        record
            .target_classes
            .iter()
            .any(|c| self.marker_classes.iter().any(|m| m == c))
    }

    /// Whether a document node is one of the engine's own artifacts.
    pub fn is_artifact_node<D: Document>(&self, doc: &D, node: D::Node) -> bool {
        if !self.cursor_id.is_empty() && doc.attribute(node, "id") == Some(&*self.cursor_id) {
            return true;
        }
        self.marker_classes.iter().any(|m| doc.has_class(node, m))
    }

    /// Records that were not caused by the engine.
    pub fn qualifying<'a>(
        &'a self,
        records: &'a [MutationRecord],
    ) -> impl Iterator<Item = &'a MutationRecord> + 'a {
        records.iter().filter(|r| !self.is_artifact(r))
    }
}
