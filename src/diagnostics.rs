use std::time::{Duration, Instant};

use anyhow::Result;

use crate::alarm::model::{AlarmStore, JsonFileStore};
use crate::notify::{DesktopNotifier, NotificationSink};
use crate::stopwatch::DISPLAY_REFRESH;
use crate::ticker::{Ticker, sleep_until};
use crate::time_provider::{SystemTimeSource, TimeSource};

const BENCH_SPAN: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct PacingReport {
    pub expected_ticks: u64,
    pub observed_ticks: u64,
    pub dropped_ticks: u64,
    pub polls: u64,
}

pub fn run_diagnostics(store: &JsonFileStore, notifier: &mut DesktopNotifier) -> Result<()> {
    println!("deskclock diagnostics");
    println!("Alarm storage: {}", store.path().display());
    match store.read() {
        Ok(alarms) => {
            println!("Stored alarms: {}", alarms.len());
            for alarm in &alarms {
                println!(
                    "  {} {} (id {}{})",
                    alarm.time,
                    alarm.label.as_deref().unwrap_or("-"),
                    alarm.id,
                    alarm
                        .last_fired
                        .map(|date| format!(", fired {date}"))
                        .unwrap_or_default()
                );
            }
        }
        Err(err) => {
            println!("Stored alarms: 0");
            println!("Stored alarm data unreadable, treating as empty: {err:#}");
        }
    }

    println!("Notifications: {:?}", notifier.request_permission());
    match notifier.tone_player() {
        Some(player) => println!("Tone player: {}", player.label()),
        None => println!("Tone player: none (tones disabled or no player found)"),
    }

    println!(
        "Running {} ms pacing check at {} ms ticks...",
        BENCH_SPAN.as_millis(),
        DISPLAY_REFRESH.as_millis()
    );
    let report = measure_pacing(DISPLAY_REFRESH, BENCH_SPAN);
    println!("Pacing summary:");
    println!("  Expected ticks: {}", report.expected_ticks);
    println!("  Observed ticks: {}", report.observed_ticks);
    println!("  Dropped ticks: {}", report.dropped_ticks);
    println!("  Loop polls: {}", report.polls);
    Ok(())
}

pub fn measure_pacing(period: Duration, span: Duration) -> PacingReport {
    let time = SystemTimeSource::new();
    let mut ticker = Ticker::new(period);
    ticker.start(time.monotonic());

    let bench_start = Instant::now();
    let bench_end = bench_start + span;
    let mut observed_ticks = 0_u64;
    let mut polls = 0_u64;
    while Instant::now() < bench_end {
        observed_ticks += u64::from(ticker.poll(time.monotonic()));
        polls += 1;
        let wait = ticker.time_until_due(time.monotonic()).unwrap_or(period);
        sleep_until((Instant::now() + wait).min(bench_end));
    }
    observed_ticks += u64::from(ticker.poll(time.monotonic()));
    ticker.stop();

    let period_ns = period.as_nanos().max(1);
    PacingReport {
        expected_ticks: (span.as_nanos() / period_ns) as u64,
        observed_ticks,
        dropped_ticks: ticker.dropped(),
        polls,
    }
}
