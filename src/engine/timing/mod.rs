//! ### English
//! Time source and the present-rate accumulator.
//!
//! ### 中文
//! 时间源与 present 速率累加器。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

mod moving_average;

pub use moving_average::MovingAverage;

/// ### English
/// Monotonic microsecond clock.
///
/// ### 中文
/// 单调的微秒时钟。
pub trait Clock: Send + Sync {
    fn now_micros(&self) -> u64;
}

/// ### English
/// `Instant`-based clock counting from its construction.
///
/// ### 中文
/// 基于 `Instant`、从构造时刻开始计数的时钟。
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now_micros(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

/// ### English
/// Clock advanced by hand; lets tests drive the present-rate accumulator deterministically.
///
/// ### 中文
/// 手动推进的时钟；便于测试确定性地驱动 present 速率累加器。
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    pub fn new(start_micros: u64) -> Self {
        Self {
            micros: AtomicU64::new(start_micros),
        }
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_micros()).unwrap_or(u64::MAX);
        self.micros.fetch_add(by, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_micros(&self) -> u64 {
        self.micros.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(5);
        clock.advance(Duration::from_millis(2));
        assert_eq!(clock.now_micros(), 2_005);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_micros();
        let b = clock.now_micros();
        assert!(b >= a);
    }
}
