use std::time::Duration;

use crate::utils::time::whole_seconds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AutosaveState {
    Idle,
    Running,
    Cancelled,
}

/// Heartbeat that reports a fixed elapsed-time delta on every tick.
///
/// A tick that fails upstream is not replayed: losing one only under-reports
/// elapsed time. Once cancelled the scheduler never fires again.
#[derive(Debug)]
pub struct AutosaveScheduler {
    interval: Duration,
    state: AutosaveState,
}

impl AutosaveScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: AutosaveState::Idle,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn delta_seconds(&self) -> u32 {
        whole_seconds(self.interval)
    }

    /// Called once the attempt identifier is known. No-op after cancel.
    pub fn start(&mut self) {
        if self.state == AutosaveState::Idle {
            self.state = AutosaveState::Running;
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == AutosaveState::Running
    }

    /// Delta to report for this tick, if the scheduler is running.
    pub fn on_tick(&mut self) -> Option<u32> {
        if !self.is_running() {
            return None;
        }
        Some(self.delta_seconds())
    }

    pub fn cancel(&mut self) {
        self.state = AutosaveState::Cancelled;
    }
}
