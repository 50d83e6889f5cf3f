// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dwell State: timers that turn sustained hovering into discrete events.
//!
//! A dwell interface has no click. A target is *selected* when the pointer
//! enters it, and *confirmed* once the pointer has stayed on it for a
//! configured duration. This crate holds that bookkeeping and nothing else:
//! it does not know about documents, geometry, or clocks.
//!
//! - [`dwell::DwellState`]: sessions keyed by activation surface.
//! - [`dwell::DwellMode`]: one-shot or repeating targets.
//! - [`dwell::DwellEvent`]: what the caller should emit.
//!
//! Time is always passed in by the caller as milliseconds from a monotonic
//! clock. Callers schedule a single wakeup at [`dwell::DwellState::next_deadline`]
//! and call [`dwell::DwellState::poll`] when it elapses.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod dwell;
