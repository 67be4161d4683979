//! Simulated-time helpers
//!
//! Travel and crossing delays are real suspensions of the calling thread;
//! timestamps are milliseconds since the clock was created.

use std::thread;
use std::time::{Duration, Instant};

/// Suspend the calling thread for the given number of milliseconds
pub fn sleep_millis(millis: u64) {
    thread::sleep(Duration::from_millis(millis));
}

/// A wall clock anchored at simulation start
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    start: Instant,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds elapsed since the clock was created
    pub fn now_millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}
