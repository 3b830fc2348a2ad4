/// Seconds left for a session that resumes an attempt.
///
/// Computed once at session start; the server's `total_time_spent` is never
/// consulted again while the session runs.
pub fn initial_time_left(duration_minutes: u32, total_time_spent: u32) -> u32 {
    duration_minutes
        .saturating_mul(60)
        .saturating_sub(total_time_spent)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClockState {
    Running,
    Expired,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    Remaining(u32),
    /// Reached zero on this tick. Returned at most once per clock.
    Expired,
    /// The clock was already expired or stopped.
    Idle,
}

/// Countdown for one session. Never goes below zero.
#[derive(Debug)]
pub struct SessionClock {
    time_left: u32,
    state: ClockState,
}

impl SessionClock {
    pub fn new(duration_minutes: u32, total_time_spent: u32) -> Self {
        let time_left = initial_time_left(duration_minutes, total_time_spent);
        let state = if time_left == 0 {
            ClockState::Expired
        } else {
            ClockState::Running
        };
        Self { time_left, state }
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Time ran out, either on a tick or before the session started.
    pub fn is_expired(&self) -> bool {
        self.state == ClockState::Expired
    }

    /// True when the resumed attempt had no time left to begin with.
    pub fn expired_on_start(&self) -> bool {
        self.state == ClockState::Expired && self.time_left == 0
    }

    pub fn tick(&mut self) -> ClockTick {
        if self.state != ClockState::Running {
            return ClockTick::Idle;
        }

        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.state = ClockState::Expired;
            ClockTick::Expired
        } else {
            ClockTick::Remaining(self.time_left)
        }
    }

    pub fn stop(&mut self) {
        self.state = ClockState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_attempt_gets_the_full_duration() {
        assert_eq!(initial_time_left(40, 0), 2400);
        assert_eq!(initial_time_left(60, 1), 3599);
    }

    #[test]
    fn resumed_attempt_subtracts_time_already_spent() {
        for spent in [0_u32, 1, 599, 1800, 2399] {
            assert_eq!(initial_time_left(40, spent), 2400 - spent);
        }
    }

    #[test]
    fn exhausted_attempt_clamps_to_zero() {
        assert_eq!(initial_time_left(40, 2400), 0);
        assert_eq!(initial_time_left(40, 9000), 0);
        assert_eq!(initial_time_left(0, 0), 0);

        let mut clock = SessionClock::new(40, 3000);
        assert!(clock.expired_on_start());
        assert_eq!(clock.tick(), ClockTick::Idle);
        assert_eq!(clock.time_left(), 0);
    }

    #[test]
    fn expires_exactly_once_after_the_last_second() {
        let mut clock = SessionClock::new(1, 57);
        assert_eq!(clock.tick(), ClockTick::Remaining(2));
        assert_eq!(clock.tick(), ClockTick::Remaining(1));
        assert_eq!(clock.tick(), ClockTick::Expired);
        assert!(!clock.is_running());
        assert!(clock.is_expired());
        assert!(!clock.expired_on_start());
        for _ in 0..5 {
            assert_eq!(clock.tick(), ClockTick::Idle);
        }
        assert_eq!(clock.time_left(), 0);
    }

    #[test]
    fn forty_minute_exam_runs_for_2400_ticks() {
        let mut clock = SessionClock::new(40, 0);
        let mut expirations = 0;
        for _ in 0..2400 {
            if clock.tick() == ClockTick::Expired {
                expirations += 1;
            }
        }
        assert_eq!(expirations, 1);
        assert_eq!(clock.tick(), ClockTick::Idle);
    }

    #[test]
    fn stopped_clock_keeps_its_value() {
        let mut clock = SessionClock::new(10, 0);
        clock.tick();
        clock.stop();
        assert_eq!(clock.tick(), ClockTick::Idle);
        assert!(!clock.is_expired());
        assert_eq!(clock.time_left(), 599);
    }
}
