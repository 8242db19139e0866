//! Cancelable scheduled callbacks on a millisecond clock.
//!
//! The clock only moves when the owner calls [`Timers::advance`] (or the
//! finer-grained [`Timers::pop_due`] / [`Timers::advance_clock`]), so expiry
//! depends on elapsed time rather than on how many frames were rendered.

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer that reached its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub id: TimerId,
    pub deadline_ms: u64,
    pub payload: T,
}

#[derive(Debug)]
pub struct Timers<T> {
    now_ms: u64,
    next_id: u64,
    // Ordered by deadline, then by scheduling order (ids are monotonic).
    pending: BTreeMap<(u64, TimerId), T>,
    deadlines: HashMap<TimerId, u64>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Timers<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `payload` to fire `delay_ms` from now.
    pub fn schedule(&mut self, delay_ms: u64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let deadline = self.now_ms.saturating_add(delay_ms);
        self.pending.insert((deadline, id), payload);
        self.deadlines.insert(id, deadline);
        id
    }

    /// Cancel a pending timer, returning its payload if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let deadline = self.deadlines.remove(&id)?;
        self.pending.remove(&(deadline, id))
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub fn deadline(&self, id: TimerId) -> Option<u64> {
        self.deadlines.get(&id).copied()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pop the earliest timer due at or before `until_ms`, moving the clock
    /// to its deadline.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Fired<T>> {
        let (&(deadline, id), _) = self.pending.iter().next()?;
        if deadline > until_ms {
            return None;
        }
        let payload = self.pending.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        self.now_ms = self.now_ms.max(deadline);
        Some(Fired {
            id,
            deadline_ms: deadline,
            payload,
        })
    }

    /// Move the clock forward without firing anything. The clock never goes
    /// backwards; timers already due stay pending until popped.
    pub fn advance_clock(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Advance the clock by `elapsed_ms`, returning every timer that came
    /// due, in deadline order.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<Fired<T>> {
        let target = self.now_ms.saturating_add(elapsed_ms);
        let mut fired = Vec::new();
        while let Some(timer) = self.pop_due(target) {
            fired.push(timer);
        }
        self.now_ms = target;
        fired
    }

    /// Drop every pending timer. The clock is left untouched.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
