use serde::{Deserialize, Serialize};

pub type QuestionId = i32;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: QuestionId,
    pub question_number: i32,
    /// Correct answer, only present outside exam mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}
