//! Named one-shot timers
//!
//! The registry never runs anything on its own. The host asks for the next
//! deadline, sleeps until then and pops due entries one at a time, so an
//! action is free to arm or cancel any key (its own included) before the
//! next entry is examined.

use crate::clock::Clock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;
use std::time::{Duration, Instant};

struct TimerEntry<A> {
    fire_at: Instant,
    seq: u64,
    action: A,
}

/// Cancellable delayed actions keyed by name
///
/// At most one entry is live per key; arming a key again replaces the
/// pending action and its deadline.
pub struct TimerRegistry<K, A> {
    clock: Rc<dyn Clock>,
    entries: HashMap<K, TimerEntry<A>>,
    next_seq: u64,
}

impl<K, A> TimerRegistry<K, A>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `action` to fire once after `delay`, replacing any pending
    /// entry under the same key
    pub fn set(&mut self, key: K, delay: Duration, action: A) {
        let fire_at = self.clock.now() + delay;
        let seq = self.next_seq;
        self.next_seq += 1;

        if self
            .entries
            .insert(key.clone(), TimerEntry { fire_at, seq, action })
            .is_some()
        {
            tracing::trace!(?key, ?delay, "timer re-armed");
        } else {
            tracing::trace!(?key, ?delay, "timer armed");
        }
    }

    /// Cancel the entry under `key`. Returns whether one was pending.
    pub fn clear(&mut self, key: &K) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            tracing::trace!(?key, "timer cleared");
        }
        removed
    }

    pub fn has(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Cancel every pending entry
    pub fn clear_all(&mut self) {
        if !self.entries.is_empty() {
            tracing::trace!(count = self.entries.len(), "clearing all timers");
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().map(|e| e.fire_at).min()
    }

    /// Remove and return the earliest entry whose deadline has passed
    ///
    /// Entries sharing a deadline come out in the order they were armed.
    pub fn pop_due(&mut self) -> Option<(K, A)> {
        let now = self.clock.now();
        let key = self
            .entries
            .iter()
            .filter(|(_, e)| e.fire_at <= now)
            .min_by_key(|(_, e)| (e.fire_at, e.seq))
            .map(|(k, _)| k.clone())?;

        let entry = self.entries.remove(&key)?;
        tracing::trace!(?key, "timer fired");
        Some((key, entry.action))
    }
}
