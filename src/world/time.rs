use serde::Serialize;
use std::time::{Duration, Instant};

/// Milliseconds since the world started. All simulation timestamps use this unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Millis(pub u64);

impl Millis {
    pub fn plus(self, millis: u64) -> Self {
        Millis(self.0.saturating_add(millis))
    }

    pub fn since(self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[derive(Debug, Clone)]
pub struct WorldClock {
    started: Instant,
}

impl WorldClock {
    pub fn start(now: Instant) -> Self {
        Self { started: now }
    }

    pub fn at(&self, instant: Instant) -> Millis {
        let elapsed = instant.saturating_duration_since(self.started);
        Millis(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Fixed-period tick deadline. The next deadline is measured from the actual start
/// of the previous pass, so a late pass delays the following one instead of
/// triggering catch-up passes.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    period: Duration,
    next_due: Instant,
}

impl TickSchedule {
    pub fn new(period: Duration, now: Instant) -> Self {
        let period = if period.is_zero() {
            Duration::from_millis(1)
        } else {
            period
        };
        Self {
            period,
            next_due: now + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }

    pub fn mark_ran(&mut self, started: Instant) {
        self.next_due = started + self.period;
    }

    /// Whether a pass that started at `started` and finished at `finished` ran past its period.
    pub fn overran(&self, started: Instant, finished: Instant) -> bool {
        finished.saturating_duration_since(started) > self.period
    }
}
