#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use exam_session::engine::modality::ModalityKind;
use exam_session::error::{Error, Result};
use exam_session::models::question::Question;
use exam_session::models::question_time::QuestionTimeRecord;
use exam_session::models::test::Test;
use exam_session::models::test_attempt::{AttemptStatus, TestAttempt};
use exam_session::services::attempt_service::AttemptService;
use uuid::Uuid;

pub fn listening_attempt(test_id: Uuid) -> TestAttempt {
    TestAttempt {
        attempt_id: Uuid::new_v4(),
        student_id: Uuid::new_v4(),
        attempt_number: 2,
        start_time: Utc::now(),
        end_time: None,
        score: None,
        status: AttemptStatus::InProgress,
        total_time_spent: 120,
        quit_count: 1,
        test: Test {
            test_id,
            title: "Listening Practice 1".into(),
            modality: ModalityKind::Listening,
            duration_minutes: 30,
            questions: (1..=10)
                .map(|n| Question {
                    question_id: 100 + n,
                    question_number: n,
                    answer: Some("B".into()),
                })
                .collect(),
            structure: Some(serde_json::json!({ "sections": 4 })),
        },
    }
}

/// In-memory attempt service that records the calls it receives.
#[derive(Default)]
pub struct FakeAttemptService {
    pub calls: Mutex<Vec<String>>,
    pub reject_submit: bool,
}

impl FakeAttemptService {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AttemptService for FakeAttemptService {
    async fn start_attempt(&self, test_id: Uuid) -> Result<TestAttempt> {
        self.record(format!("start:{}", test_id));
        Ok(listening_attempt(test_id))
    }

    async fn save_progress(&self, _attempt_id: Uuid, delta_seconds: u32) -> Result<()> {
        self.record(format!("progress:{}", delta_seconds));
        Ok(())
    }

    async fn save_question_time(&self, record: QuestionTimeRecord) -> Result<()> {
        self.record(format!(
            "question_time:{}:{}",
            record.question_id, record.time_spent_seconds
        ));
        Ok(())
    }

    async fn report_lost_focus(&self, _attempt_id: Uuid) -> Result<()> {
        self.record("lost_focus".into());
        Ok(())
    }

    async fn submit_attempt(&self, _attempt_id: Uuid) -> Result<()> {
        self.record("submit".into());
        if self.reject_submit {
            return Err(Error::upstream("already_submitted", "Attempt is closed"));
        }
        Ok(())
    }
}
