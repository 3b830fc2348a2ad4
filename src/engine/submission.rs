use serde::Serialize;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitTrigger {
    Manual,
    /// The countdown reached zero.
    Timeout,
    /// The configured number of lost-focus reports was reached.
    ViolationLimit,
}

impl SubmitTrigger {
    pub fn is_forced(self) -> bool {
        !matches!(self, SubmitTrigger::Manual)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Active,
    Submitting(SubmitTrigger),
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejected {
    #[error("submission already in progress")]
    InFlight,
    #[error("attempt has already been submitted")]
    Terminated,
}

impl From<SubmitRejected> for Error {
    fn from(rejected: SubmitRejected) -> Self {
        match rejected {
            SubmitRejected::InFlight => Error::Conflict(rejected.to_string()),
            SubmitRejected::Terminated => Error::SessionClosed,
        }
    }
}

/// Single in-flight guard for submitting an attempt.
///
/// A failed submit returns to `Active` so the candidate can retry.
#[derive(Debug)]
pub struct SubmissionController {
    phase: SubmissionPhase,
    failures: u32,
}

impl Default for SubmissionController {
    fn default() -> Self {
        Self {
            phase: SubmissionPhase::Active,
            failures: 0,
        }
    }
}

impl SubmissionController {
    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == SubmissionPhase::Active
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn begin(&mut self, trigger: SubmitTrigger) -> Result<(), SubmitRejected> {
        match self.phase {
            SubmissionPhase::Active => {
                self.phase = SubmissionPhase::Submitting(trigger);
                Ok(())
            }
            SubmissionPhase::Submitting(_) => Err(SubmitRejected::InFlight),
            SubmissionPhase::Terminated => Err(SubmitRejected::Terminated),
        }
    }

    pub fn succeed(&mut self) {
        self.phase = SubmissionPhase::Terminated;
    }

    pub fn fail(&mut self) {
        if matches!(self.phase, SubmissionPhase::Submitting(_)) {
            self.phase = SubmissionPhase::Active;
            self.failures += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_while_in_flight_is_rejected() {
        let mut controller = SubmissionController::default();
        assert_eq!(controller.begin(SubmitTrigger::Manual), Ok(()));
        assert_eq!(
            controller.begin(SubmitTrigger::Timeout),
            Err(SubmitRejected::InFlight)
        );
        assert_eq!(
            controller.phase(),
            SubmissionPhase::Submitting(SubmitTrigger::Manual)
        );
    }

    #[test]
    fn failure_allows_retry() {
        let mut controller = SubmissionController::default();
        controller.begin(SubmitTrigger::Timeout).unwrap();
        controller.fail();
        assert!(controller.is_active());
        assert_eq!(controller.failures(), 1);
        assert_eq!(controller.begin(SubmitTrigger::Manual), Ok(()));
    }

    #[test]
    fn terminated_controller_rejects_everything() {
        let mut controller = SubmissionController::default();
        controller.begin(SubmitTrigger::Manual).unwrap();
        controller.succeed();
        controller.fail();
        assert_eq!(controller.phase(), SubmissionPhase::Terminated);
        assert_eq!(
            controller.begin(SubmitTrigger::Manual),
            Err(SubmitRejected::Terminated)
        );
    }

    #[test]
    fn rejection_maps_to_conflict() {
        let err: Error = SubmitRejected::InFlight.into();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(SubmitTrigger::Timeout.is_forced());
        assert!(!SubmitTrigger::Manual.is_forced());
    }
}
