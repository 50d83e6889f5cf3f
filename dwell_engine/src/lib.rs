// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dwell Engine: dwell-driven target resolution over a live document.
//!
//! ## Overview
//!
//! Gaze trackers and switch scanners move a pointer but cannot click. This
//! crate turns a stream of pointer samples into *selections* (something is
//! under the pointer and a dwell timer is running) and *confirmations* (the
//! pointer stayed long enough, act on it).
//!
//! The host owns the page and the clock. It implements [`Document`] over its
//! node tree, forwards [`Inbound`] messages, and acts on the [`Outbound`]
//! messages the engine returns. Everything is single-threaded and driven by
//! explicit millisecond timestamps, so the whole engine is deterministic under
//! test.
//!
//! ## Pipeline
//!
//! 1) Collect: [`Collector`] walks the document and picks out visible
//!    interactive elements and navigation regions, matched by configurable
//!    [`SelectorList`]s. Nodes get stable [`ElementId`]s across passes.
//! 2) Index: [`IndexSnapshot`] stores elements in a quadtree
//!    ([`dwell_index`]) and regions in a containment tree ([`dwell_regions`]).
//!    Each rebuild produces a fresh snapshot that replaces the old one whole.
//! 3) Resolve: [`resolve`](resolver::resolve) queries a window around the
//!    pointer. The deepest regions in range win outright; otherwise elements
//!    in range are reported and the nearest becomes the dwell target.
//! 4) Dwell: per-surface sessions ([`dwell_state`]) time selections and emit
//!    confirm or cancel.
//! 5) Re-index: [`RebuildScheduler`](trigger::RebuildScheduler) coalesces
//!    mutation and scroll notifications into rebuilds, ignoring changes made to
//!    the engine's own artifacts.
//!
//! [`Engine`] ties these together.
//!
//! ## Messages
//!
//! [`Inbound`] and [`Outbound`] serialize as JSON objects with a kebab-case
//! `"type"` tag, for example:
//!
//! ```json
//! { "type": "pointer-sample", "x": 140.0, "y": 115.0 }
//! ```
//!
//! Pointer coordinates are client (viewport) coordinates. Rectangles sent back
//! to the host are document coordinates.
//!
//! ## Logging
//!
//! The engine logs through [`tracing`]: rebuilds and docking at `debug`,
//! per-sample detail at `trace`, rejected configuration and dropped messages
//! at `warn`. Install any subscriber to see them.

pub mod change;
pub mod collector;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod resolver;
pub mod selector;
pub mod snapshot;
pub mod trigger;

pub use change::{ArtifactFilter, ChangeSource, MutationRecord};
pub use collector::{Collector, ElementId, InteractiveElement};
pub use config::EngineConfig;
pub use document::{Document, MemoryDocument, Viewport};
pub use engine::Engine;
pub use error::{ConfigError, LookupError, ProtocolError, SelectorError};
pub use protocol::{Action, Inbound, Outbound, Surface, Target};
pub use selector::{Selector, SelectorList};
pub use snapshot::IndexSnapshot;
