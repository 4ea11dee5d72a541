use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

/// Wall-clock time for alarm matching plus a monotonic reading for elapsed time.
pub trait TimeSource: Send + Sync {
    fn wall_now(&self) -> DateTime<Local>;
    /// Time since the source was created; never goes backwards.
    fn monotonic(&self) -> Duration;
}

pub struct SystemTimeSource {
    monotonic_anchor: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            monotonic_anchor: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn wall_now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn monotonic(&self) -> Duration {
        self.monotonic_anchor.elapsed()
    }
}

#[cfg(test)]
pub(crate) use manual::ManualTimeSource;


#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn system_source_is_monotonic() {
        let source = SystemTimeSource::new();
        let first = source.monotonic();
        thread::sleep(Duration::from_millis(2));
        let second = source.monotonic();
        assert!(second > first);
    }

    #[test]
    fn manual_source_moves_both_clocks() {
        let start = Local::now();
        let source = ManualTimeSource::starting_at(start);
        let shared = source.clone();
        shared.advance(Duration::from_millis(1_500));
        assert_eq!(source.monotonic(), Duration::from_millis(1_500));
        assert_eq!(source.wall_now() - start, chrono::Duration::milliseconds(1_500));
    }
}
