//! Game-time deferred actions
//!
//! Short timed sequences ("start an effect, end it a second later") are
//! queued here against simulated time and fire from `advance`. Nothing runs
//! concurrently: due payloads are simply handed back to the caller in
//! deadline order, ties broken by scheduling order.

/// Handle for cancelling a scheduled payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Pending<T> {
    id: TimerId,
    deadline: f32,
    payload: T,
}

#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    now: f32,
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            now: 0.0,
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f32 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Fire `payload` once `delay` more seconds have passed
    pub fn schedule(&mut self, delay: f32, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            deadline: self.now + delay.max(0.0),
            payload,
        });
        id
    }

    /// Drop a pending payload. Returns it if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let index = self.pending.iter().position(|p| p.id == id)?;
        Some(self.pending.remove(index).payload)
    }

    /// Drop everything without firing
    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Cancelling {} pending timers", self.pending.len());
        }
        self.pending.clear();
    }

    /// Move the clock forward and collect every payload that came due
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        self.now += dt.max(0.0);
        let now = self.now;

        let (mut due, keep): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.deadline <= now);
        self.pending = keep;

        due.sort_by(|a, b| a.deadline.total_cmp(&b.deadline).then(a.id.cmp(&b.id)));
        due.into_iter().map(|p| p.payload).collect()
    }
}
