use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::test::Test;

/// Progress record for one candidate's attempt at one test, as returned by
/// the attempt service when an attempt is started or resumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestAttempt {
    pub attempt_id: Uuid,
    pub student_id: Uuid,
    pub attempt_number: i32,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub score: Option<rust_decimal::Decimal>,
    pub status: AttemptStatus,
    /// Seconds consumed across all prior sessions of this attempt.
    #[serde(default)]
    pub total_time_spent: u32,
    #[serde(default)]
    pub quit_count: i32,
    pub test: Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Submitted,
    Suspended,
}

impl TestAttempt {
    pub fn is_finalized(&self) -> bool {
        self.status == AttemptStatus::Submitted || self.end_time.is_some()
    }
}
