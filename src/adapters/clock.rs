//! System clock adapter.
//!
//! Monotonic time for the event loop comes from `std::time::Instant`
//! anchored at construction; wall-clock stamps and the display label come
//! from `chrono`'s local/UTC clocks.

use core::fmt::Write as _;
use core::time::Duration;
use std::time::Instant;

use crate::app::ports::{ClockLabel, ClockPort};

#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn monotonic(&self) -> Duration {
        self.start.elapsed()
    }

    fn epoch_millis(&self) -> u64 {
        chrono::Utc::now().timestamp_millis() as u64
    }

    fn wall_clock_label(&self) -> ClockLabel {
        let mut label = ClockLabel::new();
        // 14 characters; cannot overflow the 20-byte label.
        let _ = write!(label, "{}", chrono::Local::now().format("%m-%d %H:%M:%S"));
        label
    }
}
