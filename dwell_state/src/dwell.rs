// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dwell session tracking for pointer-over activation.
//!
//! This module converts enter/leave notifications and the passage of time into
//! select, confirm and cancel events. Each activation *surface* (the pointer
//! over the document, a toolbar button, an on-screen key) has at most one
//! session at a time, and surfaces never affect each other.
//!
//! ## Usage
//!
//! One-shot target:
//! ```
//! use dwell_state::dwell::{DwellEvent, DwellMode, DwellState};
//!
//! let mut state: DwellState<&str, u32> = DwellState::new();
//!
//! // Pointer enters element 7 at t=0 with an 800ms dwell.
//! let events = state.on_enter("doc", 7, 800, DwellMode::Once, 0);
//! assert_eq!(events, vec![DwellEvent::Selected { surface: "doc", target: 7 }]);
//! assert_eq!(state.next_deadline(), Some(800));
//!
//! // Nothing happens before the deadline.
//! assert!(state.poll(799).is_empty());
//!
//! // Exactly one confirmation at the deadline.
//! assert_eq!(state.poll(800), vec![DwellEvent::Confirmed { surface: "doc", target: 7 }]);
//! assert!(state.poll(5000).is_empty());
//! ```
//!
//! Repeating target (scroll and zoom buttons):
//! ```
//! # use dwell_state::dwell::{DwellEvent, DwellMode, DwellState};
//! let mut state: DwellState<&str, &str> = DwellState::new();
//! state.on_enter("toolbar", "scroll-down", 500, DwellMode::Repeat, 0);
//!
//! assert_eq!(state.poll(500).len(), 1);
//! assert_eq!(state.next_deadline(), Some(1000));
//! assert_eq!(state.poll(1000).len(), 1);
//!
//! // Leaving stops the repetition.
//! assert!(state.on_leave(&"toolbar").is_none());
//! assert_eq!(state.next_deadline(), None);
//! ```
//!
//! ## Rules
//!
//! 1. **Enter** starts a session in the dwelling phase and emits `Selected`.
//!    Entering the target a session already tracks is a no-op, so callers may
//!    report the current target on every pointer sample.
//! 2. **Enter on a different target** replaces the session. A session that had
//!    not fired yet emits `Cancelled` for its old target first.
//! 3. **Deadline**: `poll(now)` confirms every dwelling session whose deadline
//!    is at or before `now`. One-shot sessions move to the fired phase and stay
//!    there until the pointer leaves. Repeating sessions schedule the next
//!    deadline one duration later.
//! 4. **Leave** removes the session. A session that had not fired yet emits
//!    `Cancelled`.
//! 5. **Activate** confirms immediately, without waiting, and leaves the session
//!    in the fired phase so the pending timer cannot fire a second time.
//!
//! A session keeps the duration it was started with. Changing the configured
//! duration only affects sessions entered afterwards.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

/// Whether a target fires once per visit or repeatedly while hovered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DwellMode {
    /// Fire once, then wait for the pointer to leave and come back.
    #[default]
    Once,
    /// Fire every `duration` milliseconds until the pointer leaves.
    Repeat,
}

/// Phase of a live session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for the deadline.
    Dwelling,
    /// Fired and waiting for the pointer to leave.
    Fired,
}

/// State for the target currently hovered on one surface.
#[derive(Clone, Debug, PartialEq)]
pub struct Session<K> {
    /// Target being dwelt on.
    pub target: K,
    /// Current phase.
    pub phase: Phase,
    /// Timestamp of the enter that started the session.
    pub started_at: u64,
    /// Dwell duration in milliseconds, fixed at enter time.
    pub duration: u64,
    /// Fire once or repeatedly.
    pub mode: DwellMode,
    /// When the next confirmation is due while dwelling.
    pub deadline: u64,
    /// Number of confirmations emitted in this session.
    pub fired: u32,
}

impl<K> Session<K> {
    /// Fraction of the current dwell cycle that has elapsed, in `0.0..=1.0`.
    ///
    /// A fired one-shot session reports `1.0`.
    pub fn progress(&self, now: u64) -> f64 {
        match self.phase {
            Phase::Fired => 1.0,
            Phase::Dwelling if self.duration == 0 => 1.0,
            Phase::Dwelling => {
                let cycle_start = self.deadline.saturating_sub(self.duration);
                let elapsed = now.saturating_sub(cycle_start).min(self.duration);
                elapsed as f64 / self.duration as f64
            }
        }
    }
}

/// Event produced by the state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DwellEvent<S, K> {
    /// The pointer entered `target` and its dwell timer started.
    Selected {
        /// Surface the session belongs to.
        surface: S,
        /// Newly selected target.
        target: K,
    },
    /// The dwell completed (or was bypassed by activation) and the target's
    /// action should run.
    Confirmed {
        /// Surface the session belongs to.
        surface: S,
        /// Confirmed target.
        target: K,
    },
    /// The pointer left `target` before its dwell completed.
    Cancelled {
        /// Surface the session belonged to.
        surface: S,
        /// Abandoned target.
        target: K,
    },
}

impl<S, K> DwellEvent<S, K> {
    /// Target the event refers to.
    pub fn target(&self) -> &K {
        match self {
            Self::Selected { target, .. }
            | Self::Confirmed { target, .. }
            | Self::Cancelled { target, .. } => target,
        }
    }

    /// Surface the event refers to.
    pub fn surface(&self) -> &S {
        match self {
            Self::Selected { surface, .. }
            | Self::Confirmed { surface, .. }
            | Self::Cancelled { surface, .. } => surface,
        }
    }
}

/// Dwell sessions for any number of independent surfaces.
///
/// `S` identifies an activation surface and `K` a target on it. Sessions are
/// kept in a `BTreeMap`, so [`poll`](Self::poll) reports confirmations in
/// surface order and the output is deterministic.
#[derive(Clone, Debug)]
pub struct DwellState<S, K> {
    sessions: BTreeMap<S, Session<K>>,
}

impl<S: Ord + Clone, K: PartialEq + Clone> Default for DwellState<S, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Ord + Clone, K: PartialEq + Clone> DwellState<S, K> {
    /// Create an empty state with no sessions.
    pub fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
        }
    }

    /// Record that the pointer is over `target` on `surface`.
    ///
    /// # Arguments
    /// * `surface` - Activation surface the pointer is on
    /// * `target` - Target under the pointer
    /// * `duration` - Dwell duration in milliseconds for a new session
    /// * `mode` - Fire once or repeatedly
    /// * `now` - Current time in milliseconds
    pub fn on_enter(
        &mut self,
        surface: S,
        target: K,
        duration: u64,
        mode: DwellMode,
        now: u64,
    ) -> Vec<DwellEvent<S, K>> {
        let mut events = Vec::new();
        if let Some(existing) = self.sessions.get(&surface) {
            if existing.target == target {
                return events;
            }
            if existing.phase == Phase::Dwelling {
                events.push(DwellEvent::Cancelled {
                    surface: surface.clone(),
                    target: existing.target.clone(),
                });
            }
        }
        self.sessions.insert(
            surface.clone(),
            Session {
                target: target.clone(),
                phase: Phase::Dwelling,
                started_at: now,
                duration,
                mode,
                deadline: now.saturating_add(duration),
                fired: 0,
            },
        );
        events.push(DwellEvent::Selected { surface, target });
        events
    }

    /// Record that the pointer left `surface`.
    ///
    /// Returns `Cancelled` if the session had not fired yet.
    pub fn on_leave(&mut self, surface: &S) -> Option<DwellEvent<S, K>> {
        let session = self.sessions.remove(surface)?;
        (session.fired == 0 && session.phase == Phase::Dwelling).then(|| DwellEvent::Cancelled {
            surface: surface.clone(),
            target: session.target,
        })
    }

    /// Confirm `target` on `surface` immediately, bypassing the dwell timer.
    ///
    /// Any session on the surface is replaced by a fired session for `target`.
    pub fn activate(&mut self, surface: S, target: K, now: u64) -> DwellEvent<S, K> {
        let (started_at, duration, mode, fired) = match self.sessions.get(&surface) {
            Some(s) if s.target == target => (s.started_at, s.duration, s.mode, s.fired),
            _ => (now, 0, DwellMode::Once, 0),
        };
        self.sessions.insert(
            surface.clone(),
            Session {
                target: target.clone(),
                phase: Phase::Fired,
                started_at,
                duration,
                mode,
                deadline: now,
                fired: fired.saturating_add(1),
            },
        );
        DwellEvent::Confirmed { surface, target }
    }

    /// Confirm every dwelling session whose deadline has passed.
    ///
    /// Each session fires at most once per call. A repeating session that is
    /// polled late resumes its cadence from `now` instead of firing a burst.
    pub fn poll(&mut self, now: u64) -> Vec<DwellEvent<S, K>> {
        let mut events = Vec::new();
        for (surface, session) in &mut self.sessions {
            if session.phase != Phase::Dwelling || session.deadline > now {
                continue;
            }
            session.fired = session.fired.saturating_add(1);
            match session.mode {
                DwellMode::Once => session.phase = Phase::Fired,
                DwellMode::Repeat => {
                    let period = session.duration.max(1);
                    let next = session.deadline.saturating_add(period);
                    session.deadline = if next > now {
                        next
                    } else {
                        now.saturating_add(period)
                    };
                }
            }
            events.push(DwellEvent::Confirmed {
                surface: surface.clone(),
                target: session.target.clone(),
            });
        }
        events
    }

    /// Earliest pending deadline across all dwelling sessions.
    pub fn next_deadline(&self) -> Option<u64> {
        self.sessions
            .values()
            .filter(|s| s.phase == Phase::Dwelling)
            .map(|s| s.deadline)
            .min()
    }

    /// Session for a surface, if any.
    pub fn session(&self, surface: &S) -> Option<&Session<K>> {
        self.sessions.get(surface)
    }

    /// Target currently tracked on a surface.
    pub fn target_of(&self, surface: &S) -> Option<&K> {
        self.sessions.get(surface).map(|s| &s.target)
    }

    /// Dwell progress on a surface, see [`Session::progress`].
    pub fn progress(&self, surface: &S, now: u64) -> Option<f64> {
        self.sessions.get(surface).map(|s| s.progress(now))
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every session, returning `Cancelled` for those that had not fired.
    pub fn clear(&mut self) -> Vec<DwellEvent<S, K>> {
        let sessions = core::mem::take(&mut self.sessions);
        sessions
            .into_iter()
            .filter(|(_, s)| s.fired == 0 && s.phase == Phase::Dwelling)
            .map(|(surface, s)| DwellEvent::Cancelled {
                surface,
                target: s.target,
            })
            .collect()
    }
}
