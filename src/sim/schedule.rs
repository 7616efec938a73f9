/// Timing for the single-threaded game loop.
///
///   - `Ticker`:    fixed-interval countdown pulses, with catch-up after
///                  a stalled frame.
///   - `Scheduler`: cancelable deferred tasks (the post-clear grace delay).
///
/// Neither reads the clock; callers pass `now`.

use std::time::{Duration, Instant};

/// Identifies one cleared round awaiting replacement.
///
/// `generation` changes on every start/reset, `serial` on every round, so a
/// ticket from a superseded session or round never matches again.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RoundTicket {
    pub generation: u64,
    pub serial: u64,
}

/// Fixed-interval pulse source.
pub struct Ticker {
    interval: Duration,
    next: Instant,
}

impl Ticker {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Ticker { interval, next: now + interval }
    }

    /// Restart the phase so the first pulse lands one interval from `now`.
    pub fn reset(&mut self, now: Instant) {
        self.next = now + self.interval;
    }

    /// Number of whole intervals elapsed since the last call.
    pub fn due(&mut self, now: Instant) -> u32 {
        if self.interval.is_zero() {
            return 0;
        }
        let mut count = 0;
        while now >= self.next {
            self.next += self.interval;
            count += 1;
        }
        count
    }
}

struct Pending<T> {
    at: Instant,
    task: T,
}

/// Deferred tasks, fired in due-time order.
pub struct Scheduler<T> {
    pending: Vec<Pending<T>>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Scheduler { pending: Vec::new() }
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, task: T) {
        self.pending.push(Pending { at: now + delay, task });
    }

    /// Drop every pending task.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Remove and return all tasks due at `now`, earliest first.
    pub fn drain_due(&mut self, now: Instant) -> Vec<T> {
        let mut due: Vec<Pending<T>> = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].at <= now {
                due.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|p| p.at);
        due.into_iter().map(|p| p.task).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn ticker_counts_whole_intervals() {
        let t0 = Instant::now();
        let mut t = Ticker::new(SEC, t0);
        assert_eq!(t.due(t0 + Duration::from_millis(999)), 0);
        assert_eq!(t.due(t0 + SEC), 1);
        assert_eq!(t.due(t0 + SEC), 0);
        // Stalled for 3.5s: catch up three pulses
        assert_eq!(t.due(t0 + Duration::from_millis(4500)), 3);
    }

    #[test]
    fn ticker_reset_rephases() {
        let t0 = Instant::now();
        let mut t = Ticker::new(SEC, t0);
        t.reset(t0 + Duration::from_millis(700));
        assert_eq!(t.due(t0 + SEC), 0);
        assert_eq!(t.due(t0 + Duration::from_millis(1700)), 1);
    }

    #[test]
    fn scheduler_fires_in_order_once() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(t0, Duration::from_millis(300), "late");
        s.schedule(t0, Duration::from_millis(100), "early");
        assert!(s.drain_due(t0 + Duration::from_millis(50)).is_empty());
        assert_eq!(s.drain_due(t0 + SEC), vec!["early", "late"]);
        assert!(s.drain_due(t0 + SEC * 5).is_empty());
    }

    #[test]
    fn cancel_drops_pending() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.schedule(t0, SEC, RoundTicket { generation: 1, serial: 1 });
        s.cancel_all();
        assert!(s.drain_due(t0 + SEC * 5).is_empty());
    }
}
