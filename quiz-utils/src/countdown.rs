use crate::quiz::DEFAULT_TIME_LIMIT_S;

/// Remaining-time marks that produce a notification, in seconds.
const THRESHOLDS: [(u64, u64); 4] = [(1200, 20), (600, 10), (300, 5), (60, 1)];

/// Emitted by [`Countdown::tick`]; rendering them is the caller's concern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    ThresholdCrossed { minutes: u64 },
    Expired,
}

/// Attempt countdown. Pure data: one [`tick`](Countdown::tick) is one second,
/// driven from outside, so there is no interval callback that could outlive
/// the attempt.
#[derive(Clone, Debug)]
pub struct Countdown {
    remaining: u64,
    /// Captured once per attempt; suppresses a threshold notification that
    /// would otherwise fire on the very first tick of a quiz whose limit
    /// equals that threshold.
    initial_limit: u64,
    fired: [bool; THRESHOLDS.len()],
    expired: bool,
}

impl Countdown {
    /// A zero limit falls back to [`DEFAULT_TIME_LIMIT_S`].
    pub fn new(limit_s: u64) -> Self {
        let limit = if limit_s == 0 {
            DEFAULT_TIME_LIMIT_S
        } else {
            limit_s
        };
        Self {
            remaining: limit,
            initial_limit: limit,
            fired: [false; THRESHOLDS.len()],
            expired: false,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn initial_limit(&self) -> u64 {
        self.initial_limit
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }

    /// Advance one second and return the events this tick produced. After
    /// [`TimerEvent::Expired`] has been emitted once, further ticks return
    /// nothing.
    pub fn tick(&mut self) -> Vec<TimerEvent> {
        if self.expired {
            return Vec::new();
        }

        self.remaining = self.remaining.saturating_sub(1);

        let mut events = Vec::new();
        for (slot, (seconds, minutes)) in THRESHOLDS.iter().enumerate() {
            if self.remaining == *seconds && !self.fired[slot] && self.initial_limit != *seconds {
                self.fired[slot] = true;
                events.push(TimerEvent::ThresholdCrossed { minutes: *minutes });
            }
        }

        if self.remaining == 0 {
            self.expired = true;
            events.push(TimerEvent::Expired);
        }
        events
    }
}
