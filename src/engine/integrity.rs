//! Proctoring signals for a live exam session.
//!
//! The fullscreen watcher gates everything else: until the candidate has
//! answered the fullscreen prompt, the focus watcher stays detached and
//! window events are ignored.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FullscreenStatus {
    /// Blocking prompt shown, waiting for the candidate.
    Prompting,
    /// Candidate entered fullscreen; exits are warned about.
    Enforcing { in_fullscreen: bool },
    /// The browser refused fullscreen. The exam continues without it.
    Unenforced,
    Detached,
}

#[derive(Debug)]
pub struct FullscreenWatcher {
    status: FullscreenStatus,
}

impl Default for FullscreenWatcher {
    fn default() -> Self {
        Self {
            status: FullscreenStatus::Prompting,
        }
    }
}

impl FullscreenWatcher {
    pub fn status(&self) -> FullscreenStatus {
        self.status
    }

    pub fn is_gate_satisfied(&self) -> bool {
        matches!(
            self.status,
            FullscreenStatus::Enforcing { .. } | FullscreenStatus::Unenforced
        )
    }

    /// Returns true only for the call that satisfied the gate.
    pub fn acknowledge(&mut self, entered: bool) -> bool {
        if self.status != FullscreenStatus::Prompting {
            return false;
        }
        self.status = if entered {
            FullscreenStatus::Enforcing { in_fullscreen: true }
        } else {
            FullscreenStatus::Unenforced
        };
        true
    }

    /// Returns true when an exit should be warned about.
    pub fn on_change(&mut self, in_fullscreen: bool) -> bool {
        match self.status {
            FullscreenStatus::Enforcing { in_fullscreen: was } => {
                self.status = FullscreenStatus::Enforcing { in_fullscreen };
                was && !in_fullscreen
            }
            _ => false,
        }
    }

    pub fn detach(&mut self) {
        self.status = FullscreenStatus::Detached;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusState {
    Detached,
    Watching,
    /// A lost-focus report was sent; waiting for the window to come back.
    ReportedPendingReturn,
}

/// One report per sustained absence, acknowledged on return.
#[derive(Debug)]
pub struct FocusWatcher {
    state: FocusState,
    reports: u32,
}

impl Default for FocusWatcher {
    fn default() -> Self {
        Self {
            state: FocusState::Detached,
            reports: 0,
        }
    }
}

impl FocusWatcher {
    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn reports(&self) -> u32 {
        self.reports
    }

    pub fn attach(&mut self) {
        if self.state == FocusState::Detached {
            self.state = FocusState::Watching;
        }
    }

    /// Returns true when this blur must be reported.
    pub fn on_blur(&mut self) -> bool {
        if self.state != FocusState::Watching {
            return false;
        }
        self.state = FocusState::ReportedPendingReturn;
        self.reports += 1;
        true
    }

    /// Returns true when the candidate must be warned.
    pub fn on_focus(&mut self) -> bool {
        if self.state != FocusState::ReportedPendingReturn {
            return false;
        }
        self.state = FocusState::Watching;
        true
    }

    pub fn detach(&mut self) {
        self.state = FocusState::Detached;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityEvent {
    /// Send one lost-focus report to the attempt service.
    ReportLostFocus { reports: u32 },
    WarnFocusReturned,
    WarnFullscreenExited,
}

#[derive(Debug, Default)]
pub struct IntegrityMonitor {
    fullscreen: FullscreenWatcher,
    focus: FocusWatcher,
}

impl IntegrityMonitor {
    pub fn fullscreen_status(&self) -> FullscreenStatus {
        self.fullscreen.status()
    }

    pub fn focus_state(&self) -> FocusState {
        self.focus.state()
    }

    pub fn lost_focus_reports(&self) -> u32 {
        self.focus.reports()
    }

    pub fn is_gate_satisfied(&self) -> bool {
        self.fullscreen.is_gate_satisfied()
    }

    /// Satisfies the fullscreen gate and attaches the focus watcher.
    pub fn acknowledge_fullscreen(&mut self, entered: bool) -> bool {
        let opened = self.fullscreen.acknowledge(entered);
        if opened {
            self.focus.attach();
        }
        opened
    }

    pub fn on_fullscreen_change(&mut self, in_fullscreen: bool) -> Option<IntegrityEvent> {
        self.fullscreen
            .on_change(in_fullscreen)
            .then_some(IntegrityEvent::WarnFullscreenExited)
    }

    pub fn on_blur(&mut self) -> Option<IntegrityEvent> {
        self.focus.on_blur().then(|| IntegrityEvent::ReportLostFocus {
            reports: self.focus.reports(),
        })
    }

    pub fn on_focus(&mut self) -> Option<IntegrityEvent> {
        self.focus
            .on_focus()
            .then_some(IntegrityEvent::WarnFocusReturned)
    }

    pub fn detach(&mut self) {
        self.fullscreen.detach();
        self.focus.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acknowledged() -> IntegrityMonitor {
        let mut monitor = IntegrityMonitor::default();
        assert!(monitor.acknowledge_fullscreen(true));
        monitor
    }

    #[test]
    fn window_events_are_ignored_until_fullscreen_prompt_is_answered() {
        let mut monitor = IntegrityMonitor::default();
        assert_eq!(monitor.fullscreen_status(), FullscreenStatus::Prompting);
        assert_eq!(monitor.on_blur(), None);
        assert_eq!(monitor.on_focus(), None);
        assert_eq!(monitor.on_fullscreen_change(false), None);
        assert_eq!(monitor.focus_state(), FocusState::Detached);
        assert_eq!(monitor.lost_focus_reports(), 0);
    }

    #[test]
    fn repeated_blurs_report_once() {
        let mut monitor = acknowledged();
        assert_eq!(
            monitor.on_blur(),
            Some(IntegrityEvent::ReportLostFocus { reports: 1 })
        );
        assert_eq!(monitor.on_blur(), None);
        assert_eq!(monitor.on_blur(), None);
        assert_eq!(monitor.focus_state(), FocusState::ReportedPendingReturn);
        assert_eq!(monitor.lost_focus_reports(), 1);
    }

    #[test]
    fn return_warns_and_rearms() {
        let mut monitor = acknowledged();
        monitor.on_blur();
        assert_eq!(monitor.on_focus(), Some(IntegrityEvent::WarnFocusReturned));
        assert_eq!(monitor.on_focus(), None);
        assert_eq!(
            monitor.on_blur(),
            Some(IntegrityEvent::ReportLostFocus { reports: 2 })
        );
    }

    #[test]
    fn focus_without_prior_report_is_silent() {
        let mut monitor = acknowledged();
        assert_eq!(monitor.on_focus(), None);
        assert_eq!(monitor.focus_state(), FocusState::Watching);
    }

    #[test]
    fn refused_fullscreen_still_opens_the_gate() {
        let mut monitor = IntegrityMonitor::default();
        assert!(monitor.acknowledge_fullscreen(false));
        assert_eq!(monitor.fullscreen_status(), FullscreenStatus::Unenforced);
        assert!(monitor.is_gate_satisfied());
        assert_eq!(monitor.on_fullscreen_change(false), None);
        assert!(monitor.on_blur().is_some());
    }

    #[test]
    fn fullscreen_exit_warns_once_per_exit() {
        let mut monitor = acknowledged();
        assert!(!monitor.acknowledge_fullscreen(true));
        assert_eq!(
            monitor.on_fullscreen_change(false),
            Some(IntegrityEvent::WarnFullscreenExited)
        );
        assert_eq!(monitor.on_fullscreen_change(false), None);
        assert_eq!(monitor.on_fullscreen_change(true), None);
        assert_eq!(
            monitor.on_fullscreen_change(false),
            Some(IntegrityEvent::WarnFullscreenExited)
        );
    }

    #[test]
    fn detached_monitor_reports_nothing() {
        let mut monitor = acknowledged();
        monitor.detach();
        assert_eq!(monitor.on_blur(), None);
        assert_eq!(monitor.on_fullscreen_change(false), None);
        assert!(!monitor.is_gate_satisfied());
        assert!(!monitor.acknowledge_fullscreen(true));
    }
}
