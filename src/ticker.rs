use std::time::{Duration, Instant};

pub const SECOND: Duration = Duration::from_secs(1);
const MAX_TICKS_PER_POLL: u32 = 1024;

/// Fixed-period tick source polled against monotonic readings.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next_due: Option<Duration>,
    dropped: u64,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            next_due: None,
            dropped: 0,
        }
    }

    /// Arms the ticker; the first tick is due one period after `now`.
    pub fn start(&mut self, now: Duration) {
        self.next_due = Some(now + self.period);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// Ticks skipped because a poll arrived more than `MAX_TICKS_PER_POLL` periods late.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Returns how many periods elapsed since the last poll.
    pub fn poll(&mut self, now: Duration) -> u32 {
        let Some(mut next_due) = self.next_due else {
            return 0;
        };

        let mut ticks = 0_u32;
        while now >= next_due && ticks < MAX_TICKS_PER_POLL {
            next_due += self.period;
            ticks += 1;
        }

        if ticks == MAX_TICKS_PER_POLL && now >= next_due {
            let backlog = now.saturating_sub(next_due);
            let period_ns = self.period.as_nanos().max(1);
            let skipped = (backlog.as_nanos() / period_ns) as u64 + 1;
            self.dropped = self.dropped.saturating_add(skipped);
            next_due = now + self.period;
        }

        self.next_due = Some(next_due);
        ticks
    }

    pub fn time_until_due(&self, now: Duration) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_sub(now))
    }
}

/// Sleeps coarsely, then yields until `deadline` to keep tick jitter low.
pub fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if now >= deadline {
        return;
    }

    let remaining = deadline.saturating_duration_since(now);
    if remaining > Duration::from_millis(1) {
        std::thread::sleep(remaining - Duration::from_micros(250));
    }

    while Instant::now() < deadline {
        std::thread::yield_now();
    }
}
