use crate::foundation::core::TimeMs;
use std::collections::{BTreeMap, HashMap};

/// Handle to one scheduled event in a [`TimerQueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// A due event popped from a [`TimerQueue`].
#[derive(Clone, Debug, PartialEq)]
pub struct Fired<E> {
    /// Handle the event was scheduled under.
    pub id: TimerId,
    /// Time the event was scheduled for.
    pub due: TimeMs,
    /// The event itself.
    pub event: E,
}

/// Deferred events keyed by session-relative due time.
///
/// Scheduling returns immediately with a [`TimerId`]; nothing fires until the owner pumps the queue
/// with [`TimerQueue::pop_due`]. Events with equal due times fire in scheduling order.
///
/// The queue tracks exactly the set of outstanding events: a fired or cancelled event is gone, so
/// `len()` is the number of callbacks a teardown still has to cancel.
#[derive(Debug)]
pub struct TimerQueue<E> {
    next_id: u64,
    pending: BTreeMap<(TimeMs, TimerId), E>,
    due_by_id: HashMap<TimerId, TimeMs>,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
            due_by_id: HashMap::new(),
        }
    }

    /// Schedule `event` to fire once the pumped time reaches `due`.
    pub fn schedule_at(&mut self, due: TimeMs, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.insert((due, id), event);
        self.due_by_id.insert(id, due);
        id
    }

    /// Cancel a pending event. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let Some(due) = self.due_by_id.remove(&id) else {
            return false;
        };
        self.pending.remove(&(due, id)).is_some()
    }

    /// Cancel everything still pending and return how many events were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        self.due_by_id.clear();
        n
    }

    /// Pop the earliest event due at or before `now`.
    ///
    /// Pop one at a time so handlers may schedule follow-up events between pops.
    pub fn pop_due(&mut self, now: TimeMs) -> Option<Fired<E>> {
        let (&(due, id), _) = self.pending.first_key_value()?;
        if due > now {
            return None;
        }
        let event = self.pending.remove(&(due, id))?;
        self.due_by_id.remove(&id);
        Some(Fired { id, due, event })
    }

    /// True if `id` is still pending.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_by_id.contains_key(&id)
    }

    /// Due time of the earliest pending event.
    pub fn next_due(&self) -> Option<TimeMs> {
        self.pending.first_key_value().map(|(&(due, _), _)| due)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Iterate pending events in firing order.
    pub fn iter(&self) -> impl Iterator<Item = (TimerId, TimeMs, &E)> {
        self.pending.iter().map(|(&(due, id), e)| (id, due, e))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/timers.rs"]
mod tests;
