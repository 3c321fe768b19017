//! Redraw scheduling with optional event coalescing.
//!
//! A layer repaints in response to viewport-change events only while it has
//! something on screen. Layers with expensive draws collapse bursts of
//! viewport events into a single deferred redraw. The debounce window is an
//! explicit parameter and the deadline is polled with host-supplied
//! instants, so scheduling is fully testable.

use std::time::{Duration, Instant};

/// Whether the layer currently has content on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawState {
    /// Nothing visible; viewport events must not trigger redraws.
    Cleared,
    /// Content drawn; viewport events re-invoke the draw routine.
    Drawing,
}

/// Outcome of a redraw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawDecision {
    /// Redraw now.
    Immediate,
    /// A deferred redraw was scheduled; poll for it.
    Deferred,
    /// Dropped: either the layer is cleared or a deferred redraw is
    /// already pending.
    Suppressed,
}

/// Coalescing redraw state machine.
#[derive(Debug, Clone)]
pub struct RedrawScheduler {
    state: DrawState,
    coalesce: bool,
    delay: Duration,
    pending: bool,
    deadline: Option<Instant>,
}

impl RedrawScheduler {
    /// Default coalescing window for expensive layers.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(10);

    /// Scheduler that redraws immediately on every request.
    pub fn immediate() -> Self {
        Self {
            state: DrawState::Cleared,
            coalesce: false,
            delay: Duration::ZERO,
            pending: false,
            deadline: None,
        }
    }

    /// Scheduler that defers requests by `delay` and collapses any further
    /// requests arriving inside the window.
    pub fn coalescing(delay: Duration) -> Self {
        Self {
            state: DrawState::Cleared,
            coalesce: true,
            delay,
            pending: false,
            deadline: None,
        }
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Record that a draw completed.
    pub fn mark_drawn(&mut self) {
        self.state = DrawState::Drawing;
    }

    /// Record a clear. Drops any pending deferred redraw.
    pub fn mark_cleared(&mut self) {
        self.state = DrawState::Cleared;
        self.pending = false;
        self.deadline = None;
    }

    /// Drop a pending deferred redraw without touching the draw state.
    pub fn cancel_pending(&mut self) {
        self.pending = false;
        self.deadline = None;
    }

    /// A viewport-change event asks for a redraw.
    pub fn request(&mut self, now: Instant) -> RedrawDecision {
        if self.state == DrawState::Cleared {
            return RedrawDecision::Suppressed;
        }
        if !self.coalesce {
            return RedrawDecision::Immediate;
        }
        if self.pending {
            return RedrawDecision::Suppressed;
        }
        self.pending = true;
        self.deadline = Some(now + self.delay);
        RedrawDecision::Deferred
    }

    /// True exactly once per deferred redraw, when its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.state != DrawState::Drawing || !self.pending {
            return false;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.pending = false;
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
