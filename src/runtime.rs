use std::time::Duration;

use chrono::{DateTime, Local};
use log::debug;

use crate::alarm::model::AlarmDefinition;
use crate::alarm::scheduler::{AlarmScheduler, FiredAlarm};
use crate::countdown::{CountdownStart, CountdownTimer, TickOutcome};
use crate::error::ClockError;
use crate::notify::{AlertReport, NotificationSink};
use crate::stopwatch::Stopwatch;
use crate::ticker::{SECOND, Ticker};
use crate::time_provider::TimeSource;

#[derive(Debug, Default)]
pub struct AdvanceOutcome {
    pub seconds: u32,
    pub fired: Vec<FiredAlarm>,
    pub countdown_finished: Option<AlertReport>,
    pub stopwatch_redraw: bool,
}

/// Owns the three clocks and the one-second tick that drives alarm checks.
pub struct ClockRuntime {
    time: Box<dyn TimeSource>,
    scheduler: AlarmScheduler,
    countdown: CountdownTimer,
    stopwatch: Stopwatch,
    second_ticker: Ticker,
}

impl ClockRuntime {
    pub fn new(time: Box<dyn TimeSource>, scheduler: AlarmScheduler) -> Self {
        let mut second_ticker = Ticker::new(SECOND);
        second_ticker.start(time.monotonic());
        Self {
            time,
            scheduler,
            countdown: CountdownTimer::new(),
            stopwatch: Stopwatch::new(),
            second_ticker,
        }
    }

    pub fn advance(&mut self, sink: &mut dyn NotificationSink) -> AdvanceOutcome {
        let now = self.time.monotonic();
        let mut outcome = AdvanceOutcome {
            seconds: self.second_ticker.poll(now),
            ..AdvanceOutcome::default()
        };

        if outcome.seconds > 0 {
            let wall = self.time.wall_now();
            outcome.fired = self.scheduler.check(&wall, sink).fired;
        }
        if self.countdown.poll(now) == TickOutcome::Finished {
            outcome.countdown_finished = Some(sink.timer_finished());
        }

        outcome.stopwatch_redraw = self.stopwatch.refresh(now);
        outcome
    }

    /// Time until the next ticker is due, for pacing the caller's loop.
    pub fn next_wakeup(&self) -> Duration {
        let now = self.time.monotonic();
        [
            self.second_ticker.time_until_due(now),
            self.countdown.ticker().time_until_due(now),
            self.stopwatch.refresh_ticker().time_until_due(now),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(SECOND)
    }

    pub fn is_active(&self) -> bool {
        self.second_ticker.is_active()
    }

    /// Halts every tick source; `advance` is inert afterwards.
    pub fn shutdown(&mut self) {
        let now = self.time.monotonic();
        self.second_ticker.stop();
        self.countdown.pause();
        self.stopwatch.stop(now);
        debug!("clock runtime stopped");
    }

    pub fn wall_now(&self) -> DateTime<Local> {
        self.time.wall_now()
    }

    pub fn alarms(&self) -> &[AlarmDefinition] {
        self.scheduler.alarms()
    }

    pub fn add_alarm(
        &mut self,
        time: &str,
        label: Option<&str>,
    ) -> Result<AlarmDefinition, ClockError> {
        let created_ms = self.time.wall_now().timestamp_millis();
        self.scheduler.add(time, label, created_ms).cloned()
    }

    pub fn remove_alarm(&mut self, index: usize) -> Option<AlarmDefinition> {
        self.scheduler.remove(index)
    }

    pub fn countdown(&self) -> &CountdownTimer {
        &self.countdown
    }

    pub fn start_countdown(&mut self, input: &str) -> Result<CountdownStart, ClockError> {
        let now = self.time.monotonic();
        self.countdown.start(input, now)
    }

    pub fn pause_countdown(&mut self) {
        self.countdown.pause();
    }

    pub fn reset_countdown(&mut self) {
        self.countdown.reset();
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    pub fn start_stopwatch(&mut self) {
        let now = self.time.monotonic();
        self.stopwatch.start(now);
    }

    pub fn stop_stopwatch(&mut self) {
        let now = self.time.monotonic();
        self.stopwatch.stop(now);
    }

    pub fn reset_stopwatch(&mut self) {
        self.stopwatch.reset();
    }

    pub fn lap_stopwatch(&mut self) -> Option<Duration> {
        let now = self.time.monotonic();
        self.stopwatch.lap(now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::alarm::model::MemoryStore;
    use crate::countdown::CountdownPhase;
    use crate::notify::testing::RecordingSink;
    use crate::time_provider::ManualTimeSource;

    fn runtime_at(hour: u32, minute: u32, second: u32) -> (ClockRuntime, ManualTimeSource) {
        let wall = Local
            .with_ymd_and_hms(2026, 10, 19, hour, minute, second)
            .single()
            .expect("unambiguous local time");
        let clock = ManualTimeSource::starting_at(wall);
        let scheduler = AlarmScheduler::from_store(Box::new(MemoryStore::new()));
        (ClockRuntime::new(Box::new(clock.clone()), scheduler), clock)
    }

    #[test]
    fn alarm_fires_once_as_the_minute_arrives() {
        let (mut runtime, clock) = runtime_at(7, 29, 58);
        runtime.add_alarm("07:30", Some("Wake")).expect("alarm");
        let mut sink = RecordingSink::granted();

        let mut fired = 0;
        for _ in 0..90 {
            clock.advance(SECOND);
            fired += runtime.advance(&mut sink).fired.len();
        }
        assert_eq!(fired, 1);
        assert_eq!(sink.notifications.len(), 1);
        assert_eq!(sink.tones.len(), 1);
    }

    #[test]
    fn alarm_for_the_current_minute_fires_after_boot() {
        let (mut runtime, clock) = runtime_at(12, 0, 40);
        runtime.add_alarm("12:00", None).expect("alarm");
        let mut sink = RecordingSink::granted();
        clock.advance(SECOND);
        assert_eq!(runtime.advance(&mut sink).fired.len(), 1);
    }

    #[test]
    fn countdown_completes_once_from_runtime_polls() {
        let (mut runtime, clock) = runtime_at(9, 0, 0);
        runtime.start_countdown("0:03").expect("start");
        let mut sink = RecordingSink::denied_and_silent();

        let mut completions = 0;
        for _ in 0..10 {
            clock.advance(Duration::from_millis(500));
            if runtime.advance(&mut sink).countdown_finished.is_some() {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(runtime.countdown().phase(), CountdownPhase::Idle);
        assert_eq!(sink.prompts, vec!["Timer finished"]);
    }

    #[test]
    fn stalled_loop_catches_up_countdown_ticks() {
        let (mut runtime, clock) = runtime_at(9, 0, 0);
        runtime.start_countdown("10").expect("start");
        let mut sink = RecordingSink::granted();
        clock.advance(Duration::from_secs(4));
        assert_eq!(runtime.advance(&mut sink).seconds, 4);
        assert_eq!(runtime.countdown().remaining_secs(), 6);
    }

    #[test]
    fn stopwatch_uses_monotonic_readings() {
        let (mut runtime, clock) = runtime_at(9, 0, 0);
        let mut sink = RecordingSink::granted();
        runtime.start_stopwatch();
        clock.advance(Duration::from_millis(500));
        assert!(runtime.advance(&mut sink).stopwatch_redraw);
        runtime.stop_stopwatch();
        clock.advance(Duration::from_secs(30));
        runtime.start_stopwatch();
        clock.advance(Duration::from_millis(500));
        runtime.advance(&mut sink);
        assert_eq!(runtime.stopwatch().elapsed(), Duration::from_millis(1_000));
        assert_eq!(runtime.lap_stopwatch(), Some(Duration::from_millis(1_000)));
    }

    #[test]
    fn countdown_seconds_are_phased_from_its_start() {
        let (mut runtime, clock) = runtime_at(9, 0, 0);
        let mut sink = RecordingSink::granted();
        clock.advance(Duration::from_millis(950));
        runtime.advance(&mut sink);
        runtime.start_countdown("1").expect("start");

        clock.advance(Duration::from_millis(50));
        assert!(runtime.advance(&mut sink).countdown_finished.is_none());
        assert_eq!(runtime.countdown().remaining_secs(), 1);

        clock.advance(Duration::from_millis(950));
        assert!(runtime.advance(&mut sink).countdown_finished.is_some());
    }

    #[test]
    fn brief_resumes_do_not_consume_seconds() {
        let (mut runtime, clock) = runtime_at(9, 0, 0);
        let mut sink = RecordingSink::granted();
        runtime.start_countdown("10").expect("start");
        runtime.pause_countdown();
        clock.advance(Duration::from_millis(900));

        for _ in 0..5 {
            runtime.start_countdown("").expect("resume");
            clock.advance(Duration::from_millis(200));
            runtime.advance(&mut sink);
            runtime.pause_countdown();
            clock.advance(Duration::from_millis(800));
        }
        assert_eq!(runtime.countdown().remaining_secs(), 10);
        assert_eq!(runtime.countdown().phase(), CountdownPhase::Paused);
    }

    #[test]
    fn shutdown_leaves_no_live_ticks() {
        let (mut runtime, clock) = runtime_at(9, 0, 0);
        runtime.add_alarm("09:00", None).expect("alarm");
        runtime.start_countdown("5").expect("start");
        runtime.start_stopwatch();
        runtime.shutdown();
        assert!(!runtime.is_active());

        let mut sink = RecordingSink::granted();
        clock.advance(Duration::from_secs(10));
        let outcome = runtime.advance(&mut sink);
        assert_eq!(outcome.seconds, 0);
        assert!(outcome.fired.is_empty());
        assert!(!outcome.stopwatch_redraw);
        assert_eq!(runtime.countdown().remaining_secs(), 5);
    }

    #[test]
    fn next_wakeup_follows_the_fastest_ticker() {
        let (mut runtime, clock) = runtime_at(9, 0, 0);
        clock.advance(Duration::from_millis(400));
        assert_eq!(runtime.next_wakeup(), Duration::from_millis(600));
        runtime.start_stopwatch();
        assert_eq!(runtime.next_wakeup(), Duration::from_millis(31));
    }
}
