//! Virtual-time timer queue.
//!
//! Every multi-step mechanical sequence is a chain of relative timers. Timers
//! are keyed: scheduling a key that is already pending replaces it, so a
//! guard timer can never fire against state it no longer describes.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

/// Timers owned by the ball-lock device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceTimer {
    /// Magnet has held the ball long enough; release it and fire the crane.
    MagnetHold,
    /// Magnet has fully let go of the ball.
    MagnetRelease,
    /// Post-release settle window has elapsed.
    Settle,
}

/// Key identifying a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "owner", content = "timer", rename_all = "snake_case")]
pub enum TimerKey {
    Device(DeviceTimer),
}

/// Deterministic timer queue driven by explicit `advance` calls.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now_ms: u64,
    next_seq: u64,
    /// (due, insertion sequence) -> key, ordered for dispatch.
    queue: BTreeMap<(u64, u64), TimerKey>,
    /// key -> queue slot, for cancel/replace.
    slots: HashMap<TimerKey, (u64, u64)>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `key` to fire `delay_ms` from now, replacing any pending
    /// timer with the same key.
    pub fn schedule(&mut self, key: TimerKey, delay_ms: u64) {
        self.cancel(key);
        let slot = (self.now_ms.saturating_add(delay_ms), self.next_seq);
        self.next_seq += 1;
        self.queue.insert(slot, key);
        self.slots.insert(key, slot);
    }

    /// Cancel a pending timer. Returns whether one was pending.
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        match self.slots.remove(&key) {
            Some(slot) => {
                self.queue.remove(&slot);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, key: TimerKey) -> bool {
        self.slots.contains_key(&key)
    }

    /// Milliseconds until `key` fires, if pending.
    pub fn remaining(&self, key: TimerKey) -> Option<u64> {
        self.slots
            .get(&key)
            .map(|(due, _)| due.saturating_sub(self.now_ms))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its due time. Callers loop on this so handlers may schedule new timers
    /// that still fall inside the same window.
    pub fn pop_due(&mut self, until: u64) -> Option<(u64, TimerKey)> {
        let (&slot, &key) = self.queue.iter().next()?;
        if slot.0 > until {
            return None;
        }
        self.queue.remove(&slot);
        self.slots.remove(&key);
        self.now_ms = self.now_ms.max(slot.0);
        Some((slot.0, key))
    }

    /// Move the clock forward without dispatching anything.
    pub fn advance_to(&mut self, until: u64) {
        self.now_ms = self.now_ms.max(until);
    }
}
