use tokio::time::Instant;
use uuid::Uuid;

use crate::engine::answer_store::AnswerStore;
use crate::models::question::QuestionId;
use crate::models::question_time::QuestionTimeRecord;
use crate::utils::time::whole_seconds;

#[derive(Debug, Clone, Copy)]
struct ActiveQuestion {
    question_id: QuestionId,
    started_at: Instant,
}

/// Measures time spent on whichever question currently has input focus.
///
/// Every flush resets the interval start, so one stretch of time is never
/// reported twice. A zero-length interval produces no record.
#[derive(Debug)]
pub struct QuestionTimer {
    attempt_id: Uuid,
    active: Option<ActiveQuestion>,
}

impl QuestionTimer {
    pub fn new(attempt_id: Uuid) -> Self {
        Self {
            attempt_id,
            active: None,
        }
    }

    pub fn active_question(&self) -> Option<QuestionId> {
        self.active.map(|a| a.question_id)
    }

    /// The change handler bound to every question widget.
    ///
    /// Moving to a different question closes the previous question's interval
    /// (using its last known answer) before the new answer is stored.
    pub fn on_answer_change(
        &mut self,
        answers: &mut AnswerStore,
        question_id: QuestionId,
        value: impl Into<String>,
        now: Instant,
    ) -> Option<QuestionTimeRecord> {
        let record = match self.active {
            Some(active) if active.question_id == question_id => None,
            Some(active) => {
                let record = self.record_for(answers, active, now);
                self.active = Some(ActiveQuestion {
                    question_id,
                    started_at: now,
                });
                record
            }
            None => {
                self.active = Some(ActiveQuestion {
                    question_id,
                    started_at: now,
                });
                None
            }
        };

        answers.set(question_id, value);
        record
    }

    /// Closes the current interval but keeps the question active.
    pub fn flush(&mut self, answers: &AnswerStore, now: Instant) -> Option<QuestionTimeRecord> {
        let active = self.active?;
        let record = self.record_for(answers, active, now);
        self.active = Some(ActiveQuestion {
            started_at: now,
            ..active
        });
        record
    }

    /// Final flush at teardown. Leaves no question active.
    pub fn finish(&mut self, answers: &AnswerStore, now: Instant) -> Option<QuestionTimeRecord> {
        let active = self.active.take()?;
        self.record_for(answers, active, now)
    }

    fn record_for(
        &self,
        answers: &AnswerStore,
        active: ActiveQuestion,
        now: Instant,
    ) -> Option<QuestionTimeRecord> {
        let elapsed = now.saturating_duration_since(active.started_at);
        if elapsed.is_zero() {
            return None;
        }

        Some(QuestionTimeRecord {
            attempt_id: self.attempt_id,
            question_id: active.question_id,
            answer: answers.get(active.question_id).unwrap_or_default().to_string(),
            time_spent_seconds: whole_seconds(elapsed),
        })
    }
}
