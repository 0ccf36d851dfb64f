//! Virtual clock and one-shot timers
//!
//! Deferred work (flyer reversions) is queued against a monotonic
//! millisecond clock owned by the simulation and drained at the start of each
//! frame. Timers are owned by an entity and die with it.

use super::entity::EntityId;

/// Monotonic simulation clock in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimClock {
    now_ms: u64,
}

impl SimClock {
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    pub fn advance(&mut self, dt_ms: u64) -> u64 {
        self.now_ms = self.now_ms.saturating_add(dt_ms);
        self.now_ms
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Timer<A> {
    owner: EntityId,
    deadline_ms: u64,
    seq: u64,
    action: A,
}

/// One-shot timers keyed by (owner, deadline)
#[derive(Debug, Clone)]
pub struct TimerQueue<A> {
    timers: Vec<Timer<A>>,
    next_seq: u64,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<A> TimerQueue<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to fire once the clock reaches `deadline_ms`
    pub fn schedule(&mut self, owner: EntityId, deadline_ms: u64, action: A) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(Timer {
            owner,
            deadline_ms,
            seq,
            action,
        });
    }

    /// Drop every pending timer owned by `owner`; returns how many were dropped
    pub fn cancel_owner(&mut self, owner: EntityId) -> usize {
        let before = self.timers.len();
        self.timers.retain(|t| t.owner != owner);
        before - self.timers.len()
    }

    /// Remove and return every timer due at `now_ms`, earliest deadline first
    /// (ties keep scheduling order)
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<(EntityId, A)> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.timers.len() {
            if self.timers[i].deadline_ms <= now_ms {
                due.push(self.timers.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|t| (t.deadline_ms, t.seq));
        due.into_iter().map(|t| (t.owner, t.action)).collect()
    }

    pub fn has_pending(&self, owner: EntityId) -> bool {
        self.timers.iter().any(|t| t.owner == owner)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_at_deadline_not_before() {
        let mut queue = TimerQueue::new();
        queue.schedule(EntityId(1), 500, "revert");

        assert!(queue.drain_due(499).is_empty());
        assert_eq!(queue.drain_due(500), vec![(EntityId(1), "revert")]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drains_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(EntityId(1), 300, 'c');
        queue.schedule(EntityId(2), 100, 'a');
        queue.schedule(EntityId(3), 100, 'b');
        queue.schedule(EntityId(4), 900, 'z');

        let fired: Vec<char> = queue.drain_due(400).into_iter().map(|(_, a)| a).collect();
        assert_eq!(fired, vec!['a', 'b', 'c']);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_cancel_owner_only_drops_owned() {
        let mut queue = TimerQueue::new();
        queue.schedule(EntityId(1), 100, ());
        queue.schedule(EntityId(1), 200, ());
        queue.schedule(EntityId(2), 100, ());

        assert_eq!(queue.cancel_owner(EntityId(1)), 2);
        assert!(!queue.has_pending(EntityId(1)));
        assert!(queue.has_pending(EntityId(2)));
    }

    #[test]
    fn test_clock_advances_monotonically() {
        let mut clock = SimClock::default();
        assert_eq!(clock.advance(16), 16);
        assert_eq!(clock.advance(0), 16);
        assert_eq!(clock.now(), 16);
    }
}
