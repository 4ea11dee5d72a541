use std::time::Duration;

use log::info;

use crate::error::ClockError;
use crate::ticker::{SECOND, Ticker};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CountdownPhase {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CountdownStart {
    Started { remaining_secs: u64 },
    Resumed { remaining_secs: u64 },
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TickOutcome {
    Inactive,
    Counting,
    Finished,
}

/// Decrements come from its own one-second ticker, armed on every start or resume.
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    remaining_secs: u64,
    running: bool,
    ticker: Ticker,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self {
            remaining_secs: 0,
            running: false,
            ticker: Ticker::new(SECOND),
        }
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn phase(&self) -> CountdownPhase {
        if self.running {
            CountdownPhase::Running
        } else if self.remaining_secs > 0 {
            CountdownPhase::Paused
        } else {
            CountdownPhase::Idle
        }
    }

    /// `input` is only consulted when no remaining time is set.
    pub fn start(&mut self, input: &str, now: Duration) -> Result<CountdownStart, ClockError> {
        if self.running {
            return Ok(CountdownStart::AlreadyRunning);
        }
        if self.remaining_secs > 0 {
            self.running = true;
            self.ticker.start(now);
            return Ok(CountdownStart::Resumed {
                remaining_secs: self.remaining_secs,
            });
        }

        let secs = parse_duration_input(input);
        if secs == 0 {
            return Err(ClockError::EmptyTimerDuration);
        }
        self.remaining_secs = secs;
        self.running = true;
        self.ticker.start(now);
        info!("countdown started for {}", format_hms(secs));
        Ok(CountdownStart::Started {
            remaining_secs: secs,
        })
    }

    pub fn pause(&mut self) {
        self.running = false;
        self.ticker.stop();
    }

    pub fn reset(&mut self) {
        self.pause();
        self.remaining_secs = 0;
    }

    /// Applies every second elapsed on the timer's own ticker since the last poll.
    pub fn poll(&mut self, now: Duration) -> TickOutcome {
        let mut outcome = TickOutcome::Inactive;
        for _ in 0..self.ticker.poll(now) {
            outcome = self.tick();
            if outcome == TickOutcome::Finished {
                break;
            }
        }
        outcome
    }

    /// One decrement, independent of the ticker.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Inactive;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return TickOutcome::Counting;
        }
        self.pause();
        info!("countdown finished");
        TickOutcome::Finished
    }

    pub fn display(&self) -> String {
        format_hms(self.remaining_secs)
    }
}

/// Parses `[[HH:]MM:]SS`; non-numeric parts count as zero and parts beyond hours are ignored.
pub fn parse_duration_input(input: &str) -> u64 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return 0;
    }
    trimmed
        .rsplit(':')
        .take(3)
        .zip([1_u64, 60, 3_600])
        .map(|(part, scale)| leading_number(part).saturating_mul(scale))
        .fold(0_u64, u64::saturating_add)
}

fn leading_number(part: &str) -> u64 {
    let part = part.trim();
    let digits_end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..digits_end].parse().unwrap_or(0)
}

pub fn format_hms(total_secs: u64) -> String {
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
