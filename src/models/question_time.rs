use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::question::QuestionId;

/// Time spent on one question during one focus interval. Built at a flush
/// point, handed to the attempt service and not retained afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTimeRecord {
    pub attempt_id: Uuid,
    pub question_id: QuestionId,
    pub answer: String,
    pub time_spent_seconds: u32,
}
