// Copyright (c) 2026 kavir_m

use std::time::{Duration, Instant};

/// Coalesces bursts of trigger calls into a single firing once `wait`
/// has elapsed since the last trigger. Polled from the frame loop, so
/// there is no timer handle to cancel.
#[derive(Clone, Copy, Debug)]
pub struct Debounce {
    wait: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            deadline: None,
        }
    }

    /// Arm (or re-arm) the deadline. Repeated calls push it forward.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.wait);
    }

    /// Returns true exactly once per settled burst.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_of_triggers_fires_once() {
        let t0 = Instant::now();
        let mut db = Debounce::new(Duration::from_millis(300));

        for i in 0..5 {
            db.trigger(t0 + Duration::from_millis(i * 10));
            assert!(!db.fire(t0 + Duration::from_millis(i * 10)));
        }

        let settled = t0 + Duration::from_millis(40 + 300);
        assert!(db.fire(settled));
        assert!(!db.fire(settled + Duration::from_secs(1)));
    }

    #[test]
    fn retrigger_after_fire_arms_again() {
        let t0 = Instant::now();
        let mut db = Debounce::new(Duration::from_millis(100));

        db.trigger(t0);
        assert!(db.fire(t0 + Duration::from_millis(100)));
        assert!(!db.pending());

        db.trigger(t0 + Duration::from_millis(200));
        assert!(db.pending());
        assert!(db.fire(t0 + Duration::from_millis(300)));
    }
}
