//! Timing-window detection for reaction inputs.

use super::types::*;
use crate::events::{EventBus, EventQueue, ListenerId};
use crate::timer::{TimerId, Timers};
use tracing::{debug, trace};

/// Marker payload for the window's deadline timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Deadline;

/// A single timed reaction window. The window keeps its own millisecond
/// clock, driven by [`ParryWindow::advance`] or [`ParryWindow::advance_to`].
#[derive(Debug, Default)]
pub struct ParryWindow {
    state: ParryWindowState,
    timers: Timers<Deadline>,
    deadline_timer: Option<TimerId>,
    opened_at_ms: Option<u64>,
    events: EventBus<ParryEvent>,
}

impl ParryWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParryWindowState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// Pending deadline, if a window is open.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ParryEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn queue(&mut self) -> EventQueue<ParryEvent> {
        self.events.queue()
    }

    /// Open a window lasting `duration_ms`. The window accepts input on
    /// `[now, now + duration_ms)`.
    pub fn open(&mut self, duration_ms: u64) -> Result<(), ParryError> {
        if let Some(deadline_ms) = self.state.deadline_ms.filter(|_| self.state.is_open) {
            return Err(ParryError::AlreadyOpen { deadline_ms });
        }
        let id = self.timers.schedule(duration_ms, Deadline);
        let deadline_ms = self.timers.deadline(id);
        self.deadline_timer = Some(id);
        self.opened_at_ms = Some(self.timers.now_ms());
        self.state = ParryWindowState {
            is_open: true,
            deadline_ms,
        };
        debug!(duration_ms, ?deadline_ms, "parry window opened");
        self.events.emit(&ParryEvent::WindowOpened);
        Ok(())
    }

    /// Player input. Returns true if it landed inside an open window.
    /// Early, late and repeated inputs return false and change nothing.
    pub fn attempt(&mut self) -> bool {
        let now_ms = self.now_ms();
        let expired = self.state.deadline_ms.is_some_and(|deadline| now_ms >= deadline);
        if !self.state.is_open || expired {
            trace!(now_ms, "parry attempt outside window");
            return false;
        }
        let reaction_ms = self
            .opened_at_ms
            .map(|opened| self.now_ms().saturating_sub(opened));
        self.close();
        debug!(?reaction_ms, "parry success");
        self.events.emit(&ParryEvent::ParrySuccess);
        true
    }

    /// Close any open window without reporting an outcome. Safe to call at
    /// any time.
    pub fn reset(&mut self) {
        if self.state.is_open {
            trace!("parry window reset");
        }
        self.close();
    }

    pub fn advance(&mut self, elapsed_ms: u64) {
        let target = self.now_ms().saturating_add(elapsed_ms);
        self.advance_to(target);
    }

    /// Move the clock to `now_ms`, expiring the window if its deadline has
    /// been reached.
    pub fn advance_to(&mut self, now_ms: u64) {
        while let Some(fired) = self.timers.pop_due(now_ms) {
            self.expire(fired.id);
        }
        self.timers.advance_clock(now_ms);
    }

    fn expire(&mut self, id: TimerId) {
        if self.deadline_timer != Some(id) || !self.state.is_open {
            return;
        }
        self.close();
        debug!(now_ms = self.now_ms(), "parry window missed");
        self.events.emit(&ParryEvent::WindowMissed);
    }

    fn close(&mut self) {
        if let Some(id) = self.deadline_timer.take() {
            self.timers.cancel(id);
        }
        self.opened_at_ms = None;
        self.state = ParryWindowState::default();
    }
}
