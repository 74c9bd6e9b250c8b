//! Continuous scroll driver
//!
//! Advances a horizontal offset at constant speed. The board content is laid
//! out at least twice end to end, so wrapping by exactly one content width is
//! invisible.

use std::time::Duration;

/// Horizontal scroll state
#[derive(Debug, Clone)]
pub struct ScrollDriver {
    /// Pixels per second
    speed: f64,
    offset: f64,
    running: bool,
    wraps: u64,
}

impl ScrollDriver {
    pub fn new(speed: f64) -> Self {
        Self {
            speed,
            offset: 0.0,
            running: false,
            wraps: 0,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Halt; later ticks leave the offset untouched
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn wraps(&self) -> u64 {
        self.wraps
    }

    /// Advance by `elapsed` against the current content width
    ///
    /// `total_width` is measured by the caller on every tick since slot widths
    /// change as content changes. Returns whether the offset wrapped.
    pub fn advance(&mut self, elapsed: Duration, total_width: f64) -> bool {
        if !self.running {
            return false;
        }

        self.offset += self.speed * elapsed.as_secs_f64();

        if total_width > 0.0 && self.offset >= total_width {
            self.offset %= total_width;
            self.wraps += 1;
            return true;
        }
        false
    }
}
