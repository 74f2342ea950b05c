use chrono::{DateTime, Duration as WallDuration, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for response timers
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    /// Monotonic timestamp
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    /// Wall-clock time used to stamp logged rows
    fn wall_clock(&self) -> DateTime<Utc>;
}

/// Monotonic nanosecond timer anchored at construction
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    pub start: Instant,
}

impl Timer for HighPrecisionTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    fn wall_clock(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Hand-driven timer; clones share the same clock so a test can advance
/// time while a session owns another handle.
#[derive(Debug, Clone)]
pub struct ManualTimer {
    now_ns: Arc<AtomicU64>,
    epoch: DateTime<Utc>,
}

impl ManualTimer {
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self {
            now_ns: Arc::new(AtomicU64::new(0)),
            epoch,
        }
    }

    pub fn advance(&self, d: Duration) {
        self.now_ns
            .fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Timer for ManualTimer {
    type Timestamp = u64;
    fn now(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    fn wall_clock(&self) -> DateTime<Utc> {
        self.epoch + WallDuration::nanoseconds(self.now() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_timer_clones_share_the_clock() {
        let epoch = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let timer = ManualTimer::new(epoch);
        let handle = timer.clone();

        let start = timer.now();
        handle.advance(Duration::from_millis(750));

        assert_eq!(timer.elapsed(start), Duration::from_millis(750));
        assert_eq!(
            timer.wall_clock(),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + WallDuration::milliseconds(750)
        );
    }

    #[test]
    fn high_precision_timer_is_monotonic() {
        let timer = HighPrecisionTimer::new();
        let a = timer.now();
        let b = timer.now();
        assert!(b >= a);
        assert!(timer.elapsed(b) <= timer.elapsed(a));
    }
}
