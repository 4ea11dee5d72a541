use std::collections::VecDeque;
use std::time::Duration;

use crate::ticker::Ticker;

pub const DISPLAY_REFRESH: Duration = Duration::from_millis(31);

/// Elapsed time comes from monotonic readings; the refresh ticker only paces redraws.
#[derive(Debug, Clone)]
pub struct Stopwatch {
    start_epoch: Option<Duration>,
    elapsed: Duration,
    running: bool,
    laps: VecDeque<Duration>,
    refresh: Ticker,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            start_epoch: None,
            elapsed: Duration::ZERO,
            running: false,
            laps: VecDeque::new(),
            refresh: Ticker::new(DISPLAY_REFRESH),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Last computed elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn laps(&self) -> impl Iterator<Item = Duration> + '_ {
        self.laps.iter().copied()
    }

    pub fn refresh_ticker(&self) -> &Ticker {
        &self.refresh
    }

    pub fn start(&mut self, now: Duration) {
        if self.running {
            return;
        }
        // Readings share one anchor, so accumulated elapsed never exceeds `now`.
        self.start_epoch = Some(now.saturating_sub(self.elapsed));
        self.running = true;
        self.refresh.start(now);
    }

    pub fn stop(&mut self, now: Duration) {
        if !self.running {
            return;
        }
        self.recompute(now);
        self.running = false;
        self.refresh.stop();
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.start_epoch = None;
        self.elapsed = Duration::ZERO;
        self.laps.clear();
        self.refresh.stop();
    }

    /// Records the current elapsed time as the newest lap.
    pub fn lap(&mut self, now: Duration) -> Option<Duration> {
        if self.start_epoch.is_none() {
            return None;
        }
        if self.running {
            self.recompute(now);
        }
        self.laps.push_front(self.elapsed);
        Some(self.elapsed)
    }

    /// Returns true when the display is due for a redraw.
    pub fn refresh(&mut self, now: Duration) -> bool {
        if self.refresh.poll(now) == 0 {
            return false;
        }
        self.recompute(now);
        true
    }

    pub fn display(&self) -> String {
        format_stopwatch(self.elapsed)
    }

    fn recompute(&mut self, now: Duration) {
        if let Some(start) = self.start_epoch {
            self.elapsed = now.saturating_sub(start);
        }
    }
}

/// `HH:MM:SS.mmm` with milliseconds truncated.
pub fn format_stopwatch(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    let millis = total_ms % 1_000;
    let total_secs = total_ms / 1_000;
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn elapsed_is_continuous_across_stop_and_resume() {
        let mut stopwatch = Stopwatch::new();
        stopwatch.start(ms(10_000));
        stopwatch.stop(ms(10_500));
        assert_eq!(stopwatch.elapsed(), ms(500));

        stopwatch.start(ms(20_000));
        assert!(stopwatch.refresh(ms(20_500)));
        assert_eq!(stopwatch.elapsed(), ms(1_000));
        stopwatch.stop(ms(20_500));
        assert_eq!(stopwatch.elapsed(), ms(1_000));
    }

    #[test]
    fn elapsed_does_not_depend_on_refresh_count() {
        let mut stopwatch = Stopwatch::new();
        stopwatch.start(ms(0));
        assert!(!stopwatch.refresh(ms(30)));
        assert!(stopwatch.refresh(ms(777)));
        assert_eq!(stopwatch.elapsed(), ms(777));
    }

    #[test]
    fn lap_before_start_is_ignored() {
        let mut stopwatch = Stopwatch::new();
        assert_eq!(stopwatch.lap(ms(1_000)), None);
        assert_eq!(stopwatch.laps().count(), 0);
    }

    #[test]
    fn laps_are_most_recent_first() {
        let mut stopwatch = Stopwatch::new();
        stopwatch.start(ms(0));
        stopwatch.lap(ms(1_250));
        stopwatch.lap(ms(3_500));
        let laps: Vec<String> = stopwatch.laps().map(format_stopwatch).collect();
        assert_eq!(laps, vec!["00:00:03.500", "00:00:01.250"]);
    }

    #[test]
    fn lap_while_stopped_records_frozen_time() {
        let mut stopwatch = Stopwatch::new();
        stopwatch.start(ms(0));
        stopwatch.stop(ms(2_000));
        assert_eq!(stopwatch.lap(ms(9_000)), Some(ms(2_000)));
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut stopwatch = Stopwatch::new();
        stopwatch.stop(ms(100));
        assert!(!stopwatch.is_running());
        stopwatch.start(ms(100));
        stopwatch.start(ms(900));
        stopwatch.stop(ms(1_100));
        stopwatch.stop(ms(5_000));
        assert_eq!(stopwatch.elapsed(), ms(1_000));
    }

    #[test]
    fn reset_clears_everything_and_halts_refresh() {
        let mut stopwatch = Stopwatch::new();
        stopwatch.start(ms(0));
        stopwatch.lap(ms(400));
        stopwatch.reset();
        assert!(!stopwatch.is_running());
        assert!(!stopwatch.refresh_ticker().is_active());
        assert!(!stopwatch.refresh(ms(10_000)));
        assert_eq!(stopwatch.elapsed(), Duration::ZERO);
        assert_eq!(stopwatch.laps().count(), 0);
        assert_eq!(stopwatch.lap(ms(10_000)), None);
        assert_eq!(stopwatch.display(), "00:00:00.000");
    }

    #[test]
    fn stop_halts_refresh_ticks() {
        let mut stopwatch = Stopwatch::new();
        stopwatch.start(ms(0));
        stopwatch.stop(ms(50));
        assert!(!stopwatch.refresh(ms(5_000)));
        assert_eq!(stopwatch.elapsed(), ms(50));
    }

    #[test]
    fn formats_with_truncated_millis() {
        assert_eq!(format_stopwatch(Duration::from_micros(1_999)), "00:00:00.001");
        assert_eq!(format_stopwatch(ms(3_723_045)), "01:02:03.045");
    }
}
