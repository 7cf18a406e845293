//! One-shot timers on the host clock
//!
//! Delayed effects (answer travel, result animation) are queued here instead
//! of blocking. The host advances the clock; due actions come back in order.

/// Identifies a pending timer for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Pending<A> {
    id: TimerId,
    due_ms: f64,
    action: A,
}

#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    now_ms: f64,
    next_id: u64,
    pending: Vec<Pending<A>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            now_ms: 0.0,
            next_id: 1,
            pending: Vec::new(),
        }
    }

    pub fn now(&self) -> f64 {
        self.now_ms
    }

    /// Run `action` once `delay_ms` has elapsed on the host clock
    pub fn set_timeout(&mut self, delay_ms: f64, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due_ms: self.now_ms + delay_ms.max(0.0),
            action,
        });
        id
    }

    /// Returns false if the timer already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Drop every pending timer, returning how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Move the clock forward (never backward) and take every due action,
    /// earliest first; ties fire in scheduling order.
    pub fn advance_to(&mut self, now_ms: f64) -> Vec<A> {
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;

        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due_ms <= now {
                due.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.id.cmp(&b.id)));
        due.into_iter().map(|p| p.action).collect()
    }
}
