use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use crate::engine::session::{Notice, SessionSnapshot, SubmitOutcome};
use crate::engine::submission::SubmitTrigger;
use crate::models::question::{Question, QuestionId};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartSessionRequest {
    pub test_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub question_id: QuestionId,
    pub question_number: i32,
}

impl From<&Question> for QuestionSummary {
    fn from(q: &Question) -> Self {
        Self {
            question_id: q.question_id,
            question_number: q.question_number,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStartedResponse {
    pub session: SessionSnapshot,
    pub questions: Vec<QuestionSummary>,
    pub structure: Option<JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnswerChangeRequest {
    pub question_id: QuestionId,
    #[validate(length(max = 20000))]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSavedResponse {
    pub saved: bool,
    pub question_id: QuestionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullscreenAckRequest {
    pub entered: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullscreenChangeRequest {
    pub in_fullscreen: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusChangeRequest {
    pub focused: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoticesResponse {
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub attempt_id: Uuid,
    pub status: String,
    pub trigger: SubmitTrigger,
}

impl From<SubmitOutcome> for SubmitResponse {
    fn from(outcome: SubmitOutcome) -> Self {
        Self {
            attempt_id: outcome.attempt_id,
            status: "submitted".to_string(),
            trigger: outcome.trigger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_answer_fails_validation() {
        let req = AnswerChangeRequest {
            question_id: 1,
            value: "a".repeat(20001),
        };
        assert!(req.validate().is_err());

        let req = AnswerChangeRequest {
            question_id: 1,
            value: "a".repeat(20000),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn submit_response_reports_the_trigger() {
        let body = serde_json::to_value(SubmitResponse::from(SubmitOutcome {
            attempt_id: Uuid::nil(),
            trigger: SubmitTrigger::Timeout,
        }))
        .unwrap();
        assert_eq!(body["status"], "submitted");
        assert_eq!(body["trigger"], "timeout");
    }
}
