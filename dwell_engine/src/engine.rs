// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine: ties collection, indexing, resolution, dwell and scheduling
//! together behind the message contract.
//!
//! ## Driving the engine
//!
//! The engine is single-threaded and never reads a clock. The host:
//!
//! 1. forwards every inbound message to [`Engine::handle`] with the current time;
//! 2. sends every returned [`Outbound`] message on;
//! 3. keeps one timer armed at [`Engine::next_deadline`] and calls
//!    [`Engine::tick`] when it fires.
//!
//! ```
//! use dwell_engine::config::EngineConfig;
//! use dwell_engine::document::{Document, MemoryDocument};
//! use dwell_engine::engine::Engine;
//! use dwell_engine::protocol::{Action, Inbound, Outbound};
//! use kurbo::{Rect, Size};
//!
//! let mut doc = MemoryDocument::new(Size::new(800.0, 600.0), Size::new(800.0, 600.0));
//! let root = doc.root();
//! let button = doc.append(root, "button", Rect::new(100.0, 100.0, 180.0, 130.0));
//! doc.set_text(button, "Send");
//!
//! let mut engine = Engine::new(EngineConfig::default()).unwrap();
//! engine.handle(&doc, Inbound::RebuildRequested, 0);
//! engine.handle(&doc, Inbound::PointerSample { x: 140.0, y: 115.0 }, 1_000);
//!
//! assert_eq!(engine.next_deadline(), Some(1_800));
//! let out = engine.tick(&doc, 1_800);
//! assert!(matches!(
//!     out.as_slice(),
//!     [Outbound::TargetConfirmed { action: Action::Click, .. }]
//! ));
//! ```
//!
//! ## Docking
//!
//! When the pointer comes within range of a navigation region, the engine
//! reports the region and *docks*: the document dwell is cancelled and pointer
//! samples are ignored until the host sends [`Inbound::Undock`], or a rebuild
//! finds the region gone.

use core::fmt::Debug;
use core::hash::Hash;
use std::rc::Rc;

use dwell_state::dwell::{DwellEvent, DwellMode, DwellState};
use kurbo::{Point, Rect};
use tracing::{debug, trace, warn};

use crate::change::{ArtifactFilter, ChangeSource, ObserveOptions};
use crate::collector::{Collector, ElementId};
use crate::config::{CompiledSelectors, EngineConfig};
use crate::document::Document;
use crate::error::{ConfigError, LookupError, ProtocolError};
use crate::protocol::{
    Action, Inbound, Outbound, RebuildReason, Surface, Target, WireElement, WireRegion,
};
use crate::resolver::{primary, resolve};
use crate::snapshot::IndexSnapshot;
use crate::trigger::RebuildScheduler;

/// Dwell-resolution engine for one document.
///
/// `N` is the host document's node handle type.
#[derive(Debug)]
pub struct Engine<N> {
    config: EngineConfig,
    selectors: CompiledSelectors,
    artifacts: ArtifactFilter,
    collector: Collector<N>,
    snapshot: Rc<IndexSnapshot>,
    generation: u32,
    scheduler: RebuildScheduler,
    dwell: DwellState<Surface, Target>,
    docked: Option<ElementId>,
    last_regions: Vec<ElementId>,
    last_elements: Vec<ElementId>,
}

impl<N: Copy + Eq + Hash + Debug> Engine<N> {
    /// Create an engine with an empty index.
    ///
    /// Nothing is collected until the first rebuild, usually triggered by an
    /// [`Inbound::RebuildRequested`] once the document is ready.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let selectors = config.compile_selectors()?;
        Ok(Self {
            artifacts: ArtifactFilter::new(&config.artifacts),
            scheduler: RebuildScheduler::new(config.rebuild.clone()),
            selectors,
            config,
            collector: Collector::new(),
            snapshot: Rc::new(IndexSnapshot::empty(Rect::ZERO)),
            generation: 0,
            dwell: DwellState::new(),
            docked: None,
            last_regions: Vec::new(),
            last_elements: Vec::new(),
        })
    }

    /// Current configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The live index snapshot. Holding it keeps that generation alive across
    /// later rebuilds.
    pub fn snapshot(&self) -> Rc<IndexSnapshot> {
        Rc::clone(&self.snapshot)
    }

    /// The region the engine is docked on, if any.
    pub fn docked(&self) -> Option<ElementId> {
        self.docked
    }

    /// Subscribe to a host change source with the options the engine needs.
    pub fn observe<C: ChangeSource>(&self, source: &mut C) {
        source.subscribe(ObserveOptions::default());
    }

    /// Stop observing a host change source.
    pub fn disconnect<C: ChangeSource>(&self, source: &mut C) {
        source.unsubscribe();
    }

    /// Resolve an element id to a live node.
    pub fn lookup<D: Document<Node = N>>(&self, doc: &D, id: ElementId) -> Result<N, LookupError> {
        self.collector
            .lookup(doc, id, &self.selectors, &self.artifacts)
    }

    /// Process one inbound message, then anything that has come due.
    pub fn handle<D: Document<Node = N>>(
        &mut self,
        doc: &D,
        msg: Inbound,
        now: u64,
    ) -> Vec<Outbound> {
        let mut out = Vec::new();
        match msg {
            Inbound::RebuildRequested => {
                self.scheduler.cancel();
                self.rebuild(doc, RebuildReason::Requested, &mut out);
            }
            Inbound::DocumentMutated { records } => {
                let qualifying = self.artifacts.qualifying(&records).count();
                if qualifying == 0 {
                    trace!(records = records.len(), "ignoring engine-caused mutations");
                } else {
                    let accepted = self.scheduler.on_mutation(now);
                    trace!(qualifying, accepted, "document mutated");
                }
            }
            Inbound::ScrollSettled | Inbound::ScrollRequested => {
                self.scheduler.on_scroll(now);
                trace!(deadline = ?self.scheduler.next_deadline(), "scroll rebuild scheduled");
            }
            Inbound::PointerSample { x, y } => {
                self.on_pointer(doc, Point::new(x, y), now, &mut out);
            }
            Inbound::ControlEnter {
                surface,
                control,
                repeating,
            } => {
                let mode = if repeating {
                    DwellMode::Repeat
                } else {
                    DwellMode::Once
                };
                let events = self.dwell.on_enter(
                    Surface::Control(surface.clone()),
                    Target::Control { surface, control },
                    self.config.dwell.fine_control_ms,
                    mode,
                    now,
                );
                self.emit_dwell(doc, events, &mut out);
            }
            Inbound::ControlLeave { surface } => {
                let event = self.dwell.on_leave(&Surface::Control(surface));
                self.emit_dwell(doc, event, &mut out);
            }
            Inbound::ControlActivate { surface, control } => {
                let event = self.dwell.activate(
                    Surface::Control(surface.clone()),
                    Target::Control { surface, control },
                    now,
                );
                self.emit_dwell(doc, [event], &mut out);
            }
            Inbound::Activate => self.activate_document(doc, now, &mut out),
            Inbound::Undock => self.undock(),
            Inbound::Configure { config } => self.configure(*config, now),
        }
        self.advance(doc, now, &mut out);
        out
    }

    /// Decode and process a JSON message.
    pub fn handle_json<D: Document<Node = N>>(
        &mut self,
        doc: &D,
        json: &str,
        now: u64,
    ) -> Result<Vec<Outbound>, ProtocolError> {
        let msg = Inbound::decode(json).inspect_err(|err| {
            warn!(%err, "dropping undecodable message");
        })?;
        Ok(self.handle(doc, msg, now))
    }

    /// Run whatever has come due: a scheduled rebuild, then dwell deadlines.
    pub fn tick<D: Document<Node = N>>(&mut self, doc: &D, now: u64) -> Vec<Outbound> {
        let mut out = Vec::new();
        self.advance(doc, now, &mut out);
        out
    }

    /// Earliest time at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.scheduler.next_deadline(), self.dwell.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Dwell progress on a surface in `0.0..=1.0`, for progress indicators.
    pub fn dwell_progress(&self, surface: &Surface, now: u64) -> Option<f64> {
        self.dwell.progress(surface, now)
    }

    /// Document rectangles of the candidates last reported to the host.
    pub fn highlight_rects(&self) -> Vec<Rect> {
        if self.docked.is_some() {
            let tree = self.snapshot.regions();
            self.last_regions
                .iter()
                .filter_map(|key| tree.find_by_key(key))
                .filter_map(|id| tree.get(id).map(|a| a.rect))
                .collect()
        } else {
            self.last_elements
                .iter()
                .filter_map(|id| self.snapshot.element(*id).map(|e| e.rect))
                .collect()
        }
    }

    fn advance<D: Document<Node = N>>(&mut self, doc: &D, now: u64, out: &mut Vec<Outbound>) {
        if let Some(reason) = self.scheduler.take_due(now) {
            self.rebuild(doc, reason, out);
        }
        let events = self.dwell.poll(now);
        self.emit_dwell(doc, events, out);
    }

    fn rebuild<D: Document<Node = N>>(
        &mut self,
        doc: &D,
        reason: RebuildReason,
        out: &mut Vec<Outbound>,
    ) {
        let collection = self
            .collector
            .collect(doc, &self.selectors, &self.artifacts);
        let (elements, regions) = (collection.elements.len(), collection.regions.len());

        let boundary = Rect::from_origin_size(Point::ZERO, doc.document_size())
            .union(doc.viewport().document_rect());
        self.generation = self.generation.wrapping_add(1);
        let snapshot = IndexSnapshot::build(
            self.generation,
            collection,
            boundary,
            self.config.range.size(),
            self.config.quadtree_capacity,
        );
        let rejected = snapshot.rejected();
        if rejected > 0 {
            debug!(rejected, ?boundary, "geometry outside the index boundary");
        }
        self.snapshot = Rc::new(snapshot);
        debug!(
            generation = self.generation,
            elements,
            regions,
            rejected,
            ?reason,
            "index rebuilt"
        );

        if let Some(key) = self.docked
            && self.snapshot.regions().find_by_key(&key).is_none()
        {
            debug!(region = %key, "docked region gone; undocking");
            self.undock();
        }
        // A target that left the index (removed, hidden or scrolled away) is
        // no longer under the pointer.
        if let Some(Target::Element { id }) = self.dwell.target_of(&Surface::Document).cloned()
            && self.snapshot.element(id).is_none()
        {
            debug!(element = %id, "dwell target left the index");
            let event = self.dwell.on_leave(&Surface::Document);
            self.emit_dwell(doc, event, out);
        }
        let snapshot = &self.snapshot;
        self.last_elements
            .retain(|id| snapshot.element(*id).is_some());

        out.push(Outbound::IndexRebuilt {
            elements,
            regions,
            rejected,
            reason,
        });
    }

    fn on_pointer<D: Document<Node = N>>(
        &mut self,
        doc: &D,
        client: Point,
        now: u64,
        out: &mut Vec<Outbound>,
    ) {
        if let Some(region) = self.docked {
            trace!(%region, "docked; ignoring pointer sample");
            return;
        }
        let point = doc.viewport().point_to_document(client);
        let snapshot = Rc::clone(&self.snapshot);
        let found = resolve(&snapshot, point, self.config.range.size());
        trace!(
            x = point.x,
            y = point.y,
            regions = found.regions.len(),
            elements = found.elements.len(),
            "pointer sample"
        );

        if !found.regions.is_empty() {
            let tree = snapshot.regions();
            self.last_regions = found
                .regions
                .iter()
                .filter_map(|id| tree.get(*id).map(|a| a.key))
                .collect();
            self.last_elements.clear();
            self.docked = self.last_regions.first().copied();
            debug!(region = ?self.docked, "docked");

            let event = self.dwell.on_leave(&Surface::Document);
            self.emit_dwell(doc, event, out);
            out.push(Outbound::RegionsInRange {
                regions: found
                    .regions
                    .iter()
                    .filter_map(|id| WireRegion::from_tree(tree, *id))
                    .collect(),
            });
            return;
        }

        if found.elements != self.last_elements {
            out.push(Outbound::ElementsInRange {
                elements: found
                    .elements
                    .iter()
                    .filter_map(|id| snapshot.element(*id))
                    .map(WireElement::from)
                    .collect(),
            });
            self.last_elements.clone_from(&found.elements);
        }

        let events = match primary(&snapshot, &found, point) {
            Some(element) => self.dwell.on_enter(
                Surface::Document,
                Target::Element { id: element.id },
                self.config.dwell.generic_ms,
                DwellMode::Once,
                now,
            ),
            None => self.dwell.on_leave(&Surface::Document).into_iter().collect(),
        };
        self.emit_dwell(doc, events, out);
    }

    fn activate_document<D: Document<Node = N>>(
        &mut self,
        doc: &D,
        now: u64,
        out: &mut Vec<Outbound>,
    ) {
        let Some(target) = self.dwell.target_of(&Surface::Document).cloned() else {
            trace!("nothing selected; ignoring activation");
            return;
        };
        let event = self.dwell.activate(Surface::Document, target, now);
        self.emit_dwell(doc, [event], out);
    }

    fn undock(&mut self) {
        if self.docked.take().is_some() {
            trace!("undocked");
        }
        self.last_regions.clear();
    }

    fn configure(&mut self, config: EngineConfig, now: u64) {
        let selectors = match config.validate().and_then(|()| config.compile_selectors()) {
            Ok(selectors) => selectors,
            Err(err) => {
                warn!(%err, "rejecting configuration");
                return;
            }
        };
        let recollect = self.config.changes_collection(&config);
        self.scheduler.set_timings(config.rebuild.clone());
        self.artifacts = ArtifactFilter::new(&config.artifacts);
        self.selectors = selectors;
        self.config = config;
        if recollect {
            self.scheduler.schedule_now(now, RebuildReason::Configured);
        }
        debug!(recollect, "configuration replaced");
    }

    fn emit_dwell<D, I>(&self, doc: &D, events: I, out: &mut Vec<Outbound>)
    where
        D: Document<Node = N>,
        I: IntoIterator<Item = DwellEvent<Surface, Target>>,
    {
        for event in events {
            trace!(?event, "dwell");
            let msg = match event {
                DwellEvent::Selected { target, .. } => Outbound::TargetSelected { target },
                DwellEvent::Cancelled { target, .. } => Outbound::TargetCancelled { target },
                DwellEvent::Confirmed { target, .. } => {
                    let action = match &target {
                        Target::Control { .. } => Action::Activate,
                        Target::Element { id } => match self.lookup(doc, *id) {
                            Ok(_) => self
                                .snapshot
                                .element(*id)
                                .map_or(Action::Click, Action::for_element),
                            Err(err) => {
                                warn!(%err, "dropping confirmation");
                                continue;
                            }
                        },
                    };
                    Outbound::TargetConfirmed { target, action }
                }
            };
            out.push(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{MemNodeId, MemoryDocument};
    use kurbo::Size;

    fn page() -> (MemoryDocument, MemNodeId) {
        let mut doc = MemoryDocument::new(Size::new(800.0, 600.0), Size::new(800.0, 2000.0));
        let root = doc.root();
        let button = doc.append(root, "button", Rect::new(100.0, 100.0, 180.0, 130.0));
        doc.set_text(button, "Send");
        (doc, button)
    }

    fn engine(doc: &MemoryDocument) -> Engine<MemNodeId> {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let out = engine.handle(doc, Inbound::RebuildRequested, 0);
        assert!(matches!(out.as_slice(), [Outbound::IndexRebuilt { .. }]));
        engine
    }

    fn sample(x: f64, y: f64) -> Inbound {
        Inbound::PointerSample { x, y }
    }

    fn confirmations(out: &[Outbound]) -> usize {
        out.iter()
            .filter(|m| matches!(m, Outbound::TargetConfirmed { .. }))
            .count()
    }

    fn rebuilds(out: &[Outbound]) -> Vec<RebuildReason> {
        out.iter()
            .filter_map(|m| match m {
                Outbound::IndexRebuilt { reason, .. } => Some(*reason),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn dwell_on_element_confirms_once() {
        let (doc, button) = page();
        let mut engine = engine(&doc);
        let id = engine.collector.id_of(button).unwrap();

        let out = engine.handle(&doc, sample(140.0, 115.0), 1000);
        assert_eq!(out.len(), 2);
        let Outbound::ElementsInRange { elements } = &out[0] else {
            panic!("expected elements-in-range, got {:?}", out[0]);
        };
        assert_eq!(elements[0].id, id);
        assert_eq!(elements[0].label, "Send");
        assert_eq!(
            out[1],
            Outbound::TargetSelected {
                target: Target::Element { id }
            }
        );

        // Samples on the same target do not repeat anything.
        assert!(engine.handle(&doc, sample(141.0, 116.0), 1200).is_empty());
        assert_eq!(engine.next_deadline(), Some(1800));
        assert!(engine.tick(&doc, 1799).is_empty());
        assert_eq!(
            engine.tick(&doc, 1800),
            vec![Outbound::TargetConfirmed {
                target: Target::Element { id },
                action: Action::Click,
            }]
        );

        let mut later = Vec::new();
        for t in (1850..5000).step_by(50) {
            later.extend(engine.handle(&doc, sample(140.0, 115.0), t));
        }
        assert_eq!(confirmations(&later), 0);
    }

    #[test]
    fn leaving_early_cancels() {
        let (doc, button) = page();
        let mut engine = engine(&doc);
        let id = engine.collector.id_of(button).unwrap();

        engine.handle(&doc, sample(140.0, 115.0), 0);
        let out = engine.handle(&doc, sample(600.0, 500.0), 700);
        assert_eq!(
            out,
            vec![
                Outbound::ElementsInRange {
                    elements: Vec::new()
                },
                Outbound::TargetCancelled {
                    target: Target::Element { id }
                },
            ]
        );
        assert_eq!(confirmations(&engine.tick(&doc, 800)), 0);
        assert_eq!(engine.next_deadline(), None);
    }

    #[test]
    fn editable_targets_confirm_with_edit() {
        let (mut doc, _) = page();
        let root = doc.root();
        doc.append(root, "textarea", Rect::new(300.0, 300.0, 500.0, 400.0));
        let mut engine = engine(&doc);
        engine.handle(&doc, sample(400.0, 350.0), 0);
        let out = engine.tick(&doc, 800);
        assert!(matches!(
            out.as_slice(),
            [Outbound::TargetConfirmed {
                action: Action::Edit,
                ..
            }]
        ));
    }

    #[test]
    fn regions_dock_until_undock() {
        let (mut doc, _) = page();
        let root = doc.root();
        let nav = doc.append(root, "nav", Rect::new(0.0, 0.0, 400.0, 60.0));
        let menu = doc.append(nav, "ul", Rect::new(10.0, 10.0, 110.0, 50.0));
        doc.set_attribute(menu, "role", "menu");
        doc.set_attribute(menu, "aria-label", "Products");
        let item = doc.append(menu, "a", Rect::new(10.0, 10.0, 110.0, 30.0));
        doc.set_attribute(item, "href", "/products");
        let mut engine = engine(&doc);
        let menu_id = engine.collector.id_of(menu).unwrap();

        let out = engine.handle(&doc, sample(50.0, 30.0), 0);
        let [Outbound::RegionsInRange { regions }] = out.as_slice() else {
            panic!("expected regions-in-range, got {out:?}");
        };
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].id, menu_id);
        assert_eq!(regions[0].label, "Products");
        assert_eq!(engine.docked(), Some(menu_id));
        assert_eq!(engine.highlight_rects(), vec![Rect::new(10.0, 10.0, 110.0, 50.0)]);

        // Docked: samples, even over elements, are ignored.
        assert!(engine.handle(&doc, sample(140.0, 115.0), 100).is_empty());
        assert_eq!(engine.next_deadline(), None);

        engine.handle(&doc, Inbound::Undock, 200);
        assert_eq!(engine.docked(), None);
        let out = engine.handle(&doc, sample(140.0, 115.0), 300);
        assert!(matches!(out.last(), Some(Outbound::TargetSelected { .. })));
    }

    #[test]
    fn docking_cancels_document_dwell() {
        let (mut doc, _) = page();
        let root = doc.root();
        doc.append(root, "nav", Rect::new(0.0, 200.0, 800.0, 260.0));
        let mut engine = engine(&doc);

        engine.handle(&doc, sample(140.0, 115.0), 0);
        let out = engine.handle(&doc, sample(140.0, 210.0), 300);
        assert!(matches!(out[0], Outbound::TargetCancelled { .. }));
        assert!(matches!(out[1], Outbound::RegionsInRange { .. }));
        assert_eq!(confirmations(&engine.tick(&doc, 2000)), 0);
    }

    #[test]
    fn docked_region_removed_by_rebuild_undocks() {
        let (mut doc, _) = page();
        let root = doc.root();
        let nav = doc.append(root, "nav", Rect::new(0.0, 0.0, 400.0, 60.0));
        let mut engine = engine(&doc);
        engine.handle(&doc, sample(50.0, 30.0), 0);
        assert!(engine.docked().is_some());

        doc.remove(nav);
        engine.handle(&doc, Inbound::RebuildRequested, 10);
        assert_eq!(engine.docked(), None);
    }

    #[test]
    fn mutation_burst_rebuilds_once() {
        let (mut doc, button) = page();
        let mut engine = engine(&doc);
        engine.observe(&mut doc);

        let mut out = Vec::new();
        for t in (0..400).step_by(20) {
            doc.set_attribute(button, "data-count", &t.to_string());
            let records = doc.take_batch();
            out.extend(engine.handle(&doc, Inbound::DocumentMutated { records }, t));
        }
        assert_eq!(rebuilds(&out), vec![RebuildReason::Mutation]);
        assert_eq!(engine.next_deadline(), None);
    }

    #[test]
    fn engine_artifacts_do_not_trigger_rebuilds() {
        let (mut doc, _) = page();
        let root = doc.root();
        let cursor = doc.append(root, "div", Rect::new(0.0, 0.0, 10.0, 10.0));
        doc.set_attribute(cursor, "id", "dwell-cursor");
        let mut engine = engine(&doc);
        engine.observe(&mut doc);

        doc.set_attribute(cursor, "style", "left: 40px");
        let records = doc.take_batch();
        assert_eq!(records.len(), 1);
        let out = engine.handle(&doc, Inbound::DocumentMutated { records }, 0);
        assert!(out.is_empty());
        assert_eq!(engine.next_deadline(), None);

        engine.disconnect(&mut doc);
        doc.set_attribute(cursor, "style", "left: 80px");
        assert!(doc.take_batch().is_empty());
    }

    #[test]
    fn scroll_settle_reindexes_visible_elements() {
        let (mut doc, _) = page();
        let root = doc.root();
        let below = doc.append(root, "button", Rect::new(100.0, 1000.0, 180.0, 1030.0));
        let mut engine = engine(&doc);
        assert!(engine.collector.id_of(below).is_none());

        doc.scroll_to(0.0, 800.0);
        assert!(engine.handle(&doc, Inbound::ScrollSettled, 0).is_empty());
        assert!(engine.handle(&doc, Inbound::ScrollSettled, 100).is_empty());
        assert_eq!(engine.next_deadline(), Some(250));
        let out = engine.tick(&doc, 250);
        assert_eq!(rebuilds(&out), vec![RebuildReason::Scroll]);
        let id = engine.collector.id_of(below).unwrap();

        // Client coordinates map onto the scrolled document.
        let out = engine.handle(&doc, sample(140.0, 215.0), 300);
        assert_eq!(
            out.last(),
            Some(&Outbound::TargetSelected {
                target: Target::Element { id }
            })
        );
    }

    #[test]
    fn removed_target_is_cancelled_on_rebuild() {
        let (mut doc, button) = page();
        let mut engine = engine(&doc);
        let id = engine.collector.id_of(button).unwrap();
        engine.handle(&doc, sample(140.0, 115.0), 0);

        doc.remove(button);
        let out = engine.handle(&doc, Inbound::RebuildRequested, 100);
        assert!(out.contains(&Outbound::TargetCancelled {
            target: Target::Element { id }
        }));
        assert_eq!(confirmations(&engine.tick(&doc, 800)), 0);
        assert_eq!(engine.lookup(&doc, id), Err(LookupError::Unknown(id)));
    }

    #[test]
    fn replaced_target_confirms_through_position_fallback() {
        let (mut doc, button) = page();
        let mut engine = engine(&doc);
        engine.handle(&doc, sample(140.0, 115.0), 0);

        // Re-rendered in place without a rebuild in between.
        doc.remove(button);
        let root = doc.root();
        let replacement = doc.append(root, "button", Rect::new(100.0, 100.0, 180.0, 130.0));
        let id = engine.collector.id_of(button).unwrap();
        assert_eq!(engine.lookup(&doc, id), Ok(replacement));
        assert_eq!(confirmations(&engine.tick(&doc, 800)), 1);
    }

    #[test]
    fn controls_repeat_and_activate() {
        let (doc, _) = page();
        let mut engine = engine(&doc);
        let scroll = Target::Control {
            surface: "toolbar".into(),
            control: "scroll-down".into(),
        };

        let out = engine.handle(
            &doc,
            Inbound::ControlEnter {
                surface: "toolbar".into(),
                control: "scroll-down".into(),
                repeating: true,
            },
            0,
        );
        assert_eq!(
            out,
            vec![Outbound::TargetSelected {
                target: scroll.clone()
            }]
        );
        assert_eq!(engine.next_deadline(), Some(500));
        let toolbar = Surface::Control("toolbar".into());
        assert_eq!(engine.dwell_progress(&toolbar, 250), Some(0.5));

        let mut out = engine.tick(&doc, 500);
        out.extend(engine.tick(&doc, 1000));
        assert_eq!(
            out,
            vec![
                Outbound::TargetConfirmed {
                    target: scroll.clone(),
                    action: Action::Activate,
                };
                2
            ]
        );
        let out = engine.handle(
            &doc,
            Inbound::ControlLeave {
                surface: "toolbar".into(),
            },
            1200,
        );
        assert!(out.is_empty());

        let out = engine.handle(
            &doc,
            Inbound::ControlActivate {
                surface: "keyboard".into(),
                control: "a".into(),
            },
            1300,
        );
        assert_eq!(confirmations(&out), 1);
        assert_eq!(engine.next_deadline(), None);
    }

    #[test]
    fn control_sessions_do_not_disturb_document_dwell() {
        let (doc, _) = page();
        let mut engine = engine(&doc);
        engine.handle(&doc, sample(140.0, 115.0), 0);
        engine.handle(
            &doc,
            Inbound::ControlEnter {
                surface: "toolbar".into(),
                control: "zoom-in".into(),
                repeating: false,
            },
            100,
        );
        engine.handle(
            &doc,
            Inbound::ControlLeave {
                surface: "toolbar".into(),
            },
            200,
        );
        assert_eq!(confirmations(&engine.tick(&doc, 800)), 1);
    }

    #[test]
    fn configure_replaces_settings() {
        let (mut doc, _) = page();
        let root = doc.root();
        let link = doc.append(root, "a", Rect::new(300.0, 100.0, 380.0, 130.0));
        doc.set_attribute(link, "href", "/");
        let mut engine = engine(&doc);
        assert_eq!(engine.snapshot().elements().len(), 2);

        // Invalid configurations are ignored.
        let bad = EngineConfig {
            dwell: crate::config::DwellTimings {
                generic_ms: 0,
                fine_control_ms: 500,
            },
            ..EngineConfig::default()
        };
        let out = engine.handle(
            &doc,
            Inbound::Configure {
                config: Box::new(bad),
            },
            10,
        );
        assert!(out.is_empty());
        assert_eq!(engine.config().dwell.generic_ms, 800);

        // New selectors rebuild right away.
        let links_only = EngineConfig {
            element_selectors: vec!["a[href]".into()],
            ..EngineConfig::default()
        };
        let out = engine.handle(
            &doc,
            Inbound::Configure {
                config: Box::new(links_only),
            },
            20,
        );
        assert_eq!(rebuilds(&out), vec![RebuildReason::Configured]);
        assert_eq!(engine.snapshot().elements().len(), 1);
    }

    #[test]
    fn pending_dwell_keeps_its_duration() {
        let (doc, _) = page();
        let mut engine = engine(&doc);
        engine.handle(&doc, sample(140.0, 115.0), 0);

        let slower = EngineConfig {
            dwell: crate::config::DwellTimings {
                generic_ms: 2000,
                fine_control_ms: 500,
            },
            ..EngineConfig::default()
        };
        let out = engine.handle(
            &doc,
            Inbound::Configure {
                config: Box::new(slower),
            },
            100,
        );
        assert!(rebuilds(&out).is_empty());
        assert_eq!(confirmations(&engine.tick(&doc, 800)), 1);
    }

    #[test]
    fn old_snapshot_survives_rebuild() {
        let (mut doc, _) = page();
        let mut engine = engine(&doc);
        let before = engine.snapshot();
        let root = doc.root();
        doc.append(root, "button", Rect::new(300.0, 300.0, 350.0, 330.0));
        engine.handle(&doc, Inbound::RebuildRequested, 10);

        assert_eq!(before.elements().len(), 1);
        assert_eq!(engine.snapshot().elements().len(), 2);
        assert!(engine.snapshot().generation() > before.generation());
    }

    #[test]
    fn highlight_follows_candidates() {
        let (doc, _) = page();
        let mut engine = engine(&doc);
        assert!(engine.highlight_rects().is_empty());
        engine.handle(&doc, sample(140.0, 115.0), 0);
        assert_eq!(engine.highlight_rects(), vec![Rect::new(100.0, 100.0, 180.0, 130.0)]);
        engine.handle(&doc, sample(600.0, 500.0), 10);
        assert!(engine.highlight_rects().is_empty());
    }

    #[test]
    fn json_entry_point() {
        let (doc, _) = page();
        let mut engine = engine(&doc);
        let out = engine
            .handle_json(&doc, r#"{ "type": "pointer-sample", "x": 140, "y": 115 }"#, 0)
            .unwrap();
        assert_eq!(out.len(), 2);
        let encoded = out[1].encode().unwrap();
        assert!(encoded.starts_with(r#"{"type":"target-selected""#));

        assert!(matches!(
            engine.handle_json(&doc, "{}", 10),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn next_deadline_is_earliest_of_rebuild_and_dwell() {
        let (doc, _) = page();
        let mut engine = engine(&doc);
        engine.handle(&doc, sample(140.0, 115.0), 0);
        engine.handle(&doc, Inbound::ScrollRequested, 0);
        assert_eq!(engine.next_deadline(), Some(150));
        engine.tick(&doc, 150);
        assert_eq!(engine.next_deadline(), Some(800));
    }

    #[test]
    fn removed_target_without_replacement_is_dropped() {
        let (mut doc, button) = page();
        let mut engine = engine(&doc);
        let id = engine.collector.id_of(button).unwrap();
        engine.handle(&doc, sample(140.0, 115.0), 0);

        // Only the body is left under the old position.
        doc.remove(button);
        assert_eq!(
            doc.node_at_client_point(Point::new(140.0, 115.0)),
            Some(doc.root())
        );
        assert_eq!(engine.lookup(&doc, id), Err(LookupError::Detached(id)));
        assert!(engine.tick(&doc, 800).is_empty());
        assert_eq!(engine.next_deadline(), None);
    }

    #[test]
    fn scrolled_away_target_is_cancelled_on_rebuild() {
        let (mut doc, _) = page();
        let root = doc.root();
        let notes = doc.append(root, "textarea", Rect::new(300.0, 300.0, 500.0, 400.0));
        let mut engine = engine(&doc);
        let id = engine.collector.id_of(notes).unwrap();
        engine.handle(&doc, sample(400.0, 350.0), 0);

        doc.scroll_to(0.0, 800.0);
        engine.handle(&doc, Inbound::ScrollSettled, 100);
        let out = engine.tick(&doc, 250);
        assert_eq!(rebuilds(&out), vec![RebuildReason::Scroll]);
        assert!(out.contains(&Outbound::TargetCancelled {
            target: Target::Element { id }
        }));
        assert_eq!(confirmations(&engine.tick(&doc, 800)), 0);
    }

    #[test]
    fn activate_confirms_selection_immediately() {
        let (doc, button) = page();
        let mut engine = engine(&doc);
        let id = engine.collector.id_of(button).unwrap();

        // Nothing selected yet.
        assert!(engine.handle(&doc, Inbound::Activate, 0).is_empty());

        engine.handle(&doc, sample(140.0, 115.0), 100);
        let out = engine.handle(&doc, Inbound::Activate, 300);
        assert_eq!(
            out,
            vec![Outbound::TargetConfirmed {
                target: Target::Element { id },
                action: Action::Click,
            }]
        );
        // The pending dwell is consumed.
        assert_eq!(engine.next_deadline(), None);
        assert_eq!(confirmations(&engine.tick(&doc, 900)), 0);
    }
}
