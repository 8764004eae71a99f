//! Event Loop Implementation
//!
//! Deterministic virtual-time timer queue. Time only advances when the
//! driver asks for it, which makes accounting reproducible in tests and
//! in simulated page sessions.

use std::time::Duration;

use crate::clock::{Clock, ManualClock, Timestamp};
use crate::timers::{TimerFacility, TimerHandle};

/// Interval timer
#[derive(Debug, Clone)]
struct Timer {
    handle: TimerHandle,
    period: Duration,
    next_due: Timestamp,
}

/// Virtual-time event loop
#[derive(Debug, Default)]
pub struct EventLoop {
    clock: ManualClock,
    /// Live interval timers
    timers: Vec<Timer>,
    /// Next timer ID
    next_timer_id: u32,
    /// Firings delivered so far
    fired: u64,
}

impl EventLoop {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            timers: Vec::new(),
            next_timer_id: 1,
            fired: 0,
        }
    }

    /// Clock shared with the loop
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Earliest pending firing
    pub fn next_due(&self) -> Option<Timestamp> {
        self.timers.iter().map(|t| t.next_due).min()
    }

    /// Pop the earliest firing due at or before `until`.
    ///
    /// Moves the clock to the firing's due time and reschedules the
    /// interval. Ties fire in creation order.
    pub fn pop_due(&mut self, until: Timestamp) -> Option<TimerHandle> {
        let timer = self
            .timers
            .iter_mut()
            .filter(|t| t.next_due <= until)
            .min_by_key(|t| (t.next_due, t.handle))?;

        let due = timer.next_due;
        timer.next_due = due.checked_add(timer.period).unwrap_or(due);
        let handle = timer.handle;

        self.clock.advance_to(due);
        self.fired += 1;
        Some(handle)
    }

    /// Move the clock forward without firing anything
    pub fn advance_to(&mut self, to: Timestamp) {
        self.clock.advance_to(to);
    }

    /// Check if there are live timers
    pub fn has_pending(&self) -> bool {
        !self.timers.is_empty()
    }

    pub fn live_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }
}

impl TimerFacility for EventLoop {
    fn set_interval(&mut self, period: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_timer_id);
        self.next_timer_id += 1;
        let now = self.clock.now();
        self.timers.push(Timer {
            handle,
            period,
            next_due: now.checked_add(period).unwrap_or(now),
        });
        handle
    }

    fn clear_interval(&mut self, handle: TimerHandle) {
        self.timers.retain(|t| t.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn test_interval_fires_each_period() {
        let mut loop_ = EventLoop::new(ManualClock::new());
        let handle = loop_.set_interval(SECOND);

        let until = Timestamp::from_millis(3500);
        let mut times = Vec::new();
        while let Some(h) = loop_.pop_due(until) {
            assert_eq!(h, handle);
            times.push(loop_.now());
        }

        assert_eq!(
            times,
            vec![
                Timestamp::from_millis(1000),
                Timestamp::from_millis(2000),
                Timestamp::from_millis(3000),
            ]
        );
        assert_eq!(loop_.next_due(), Some(Timestamp::from_millis(4000)));
        assert_eq!(loop_.fired(), 3);
    }

    #[test]
    fn test_cleared_interval_never_fires() {
        let mut loop_ = EventLoop::new(ManualClock::new());
        let handle = loop_.set_interval(SECOND);
        loop_.clear_interval(handle);

        assert_eq!(loop_.pop_due(Timestamp::from_millis(10_000)), None);
        assert!(!loop_.has_pending());
        assert_eq!(loop_.fired(), 0);
    }

    #[test]
    fn test_interleaved_intervals_in_time_order() {
        let clock = ManualClock::new();
        let mut loop_ = EventLoop::new(clock.clone());
        let slow = loop_.set_interval(Duration::from_millis(300));
        let fast = loop_.set_interval(Duration::from_millis(200));

        let mut order = Vec::new();
        while let Some(h) = loop_.pop_due(Timestamp::from_millis(600)) {
            order.push((h, clock.now()));
        }

        assert_eq!(
            order,
            vec![
                (fast, Timestamp::from_millis(200)),
                (slow, Timestamp::from_millis(300)),
                (fast, Timestamp::from_millis(400)),
                (slow, Timestamp::from_millis(600)),
                (fast, Timestamp::from_millis(600)),
            ]
        );
    }

    #[test]
    fn test_interval_starts_from_current_time() {
        let clock = ManualClock::new();
        let mut loop_ = EventLoop::new(clock.clone());
        loop_.advance_to(Timestamp::from_millis(5000));

        loop_.set_interval(SECOND);
        assert_eq!(loop_.next_due(), Some(Timestamp::from_millis(6000)));
    }
}
