// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Re-index scheduling.
//!
//! [`RebuildScheduler`] decides *when* to rebuild; it never rebuilds itself.
//! At most one rebuild is pending at a time.
//!
//! - **Mutations** are throttled on the leading edge. The first qualifying
//!   mutation schedules a rebuild after the settle delay and opens a cool-down
//!   window; mutations inside the window are ignored, so a burst of any size
//!   yields exactly one rebuild.
//! - **Scrolls** are debounced on the trailing edge. Every scroll event pushes
//!   the pending rebuild out to one settle delay after it.
//! - **Explicit requests** rebuild immediately and drop whatever was pending.

use crate::config::RebuildTimings;
use crate::protocol::RebuildReason;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Pending {
    at: u64,
    reason: RebuildReason,
}

/// Coalesces change notifications into rebuild deadlines.
#[derive(Clone, Debug)]
pub struct RebuildScheduler {
    timings: RebuildTimings,
    pending: Option<Pending>,
    cooldown_until: Option<u64>,
}

impl RebuildScheduler {
    /// Create an idle scheduler.
    pub fn new(timings: RebuildTimings) -> Self {
        Self {
            timings,
            pending: None,
            cooldown_until: None,
        }
    }

    /// Replace the delays. A pending deadline is kept as scheduled.
    pub fn set_timings(&mut self, timings: RebuildTimings) {
        self.timings = timings;
    }

    /// Note a qualifying mutation. Returns whether it was accepted.
    pub fn on_mutation(&mut self, now: u64) -> bool {
        if self.cooldown_until.is_some_and(|until| now < until) {
            return false;
        }
        self.cooldown_until = Some(now.saturating_add(self.timings.mutation_cooldown_ms));
        if self.pending.is_none() {
            self.pending = Some(Pending {
                at: now.saturating_add(self.timings.mutation_settle_ms),
                reason: RebuildReason::Mutation,
            });
        }
        true
    }

    /// Note a scroll (user or programmatic).
    pub fn on_scroll(&mut self, now: u64) {
        self.pending = Some(Pending {
            at: now.saturating_add(self.timings.scroll_settle_ms),
            reason: RebuildReason::Scroll,
        });
    }

    /// Schedule a rebuild for `reason` at `now`, keeping an earlier deadline.
    pub fn schedule_now(&mut self, now: u64, reason: RebuildReason) {
        if self.pending.is_some_and(|p| p.at <= now) {
            return;
        }
        self.pending = Some(Pending { at: now, reason });
    }

    /// Drop any pending rebuild.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// If a rebuild is due, clear it and return its reason.
    pub fn take_due(&mut self, now: u64) -> Option<RebuildReason> {
        match self.pending {
            Some(p) if p.at <= now => {
                self.pending = None;
                Some(p.reason)
            }
            _ => None,
        }
    }

    /// When the pending rebuild is due.
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.map(|p| p.at)
    }

    /// Whether a rebuild is pending.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
