use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::question::QuestionId;

/// Uniform response wrapper used by every attempt service endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiFailure {
    pub code: String,
    pub message: String,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiFailure {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    pub fn into_result(self) -> Result<Option<T>> {
        if self.success {
            return Ok(self.data);
        }
        Err(match self.error {
            Some(failure) => Error::upstream(failure.code, failure.message),
            None => Error::upstream("unknown", "Attempt service reported failure without details"),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProgressRequest {
    pub delta_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveQuestionTimeRequest {
    pub question_id: QuestionId,
    pub answer: String,
    pub time_spent_seconds: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::IgnoredAny;

    #[test]
    fn success_envelope_without_data_is_accepted() {
        let envelope: ApiEnvelope<IgnoredAny> =
            serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(envelope.into_result().unwrap().is_none());
    }

    #[test]
    fn failure_envelope_becomes_upstream_error() {
        let envelope: ApiEnvelope<IgnoredAny> = serde_json::from_str(
            r#"{"success": false, "error": {"code": "already_submitted", "message": "Attempt is closed"}}"#,
        )
        .unwrap();
        match envelope.into_result() {
            Err(Error::Upstream { code, message }) => {
                assert_eq!(code, "already_submitted");
                assert_eq!(message, "Attempt is closed");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn question_time_body_uses_camel_case() {
        let body = serde_json::to_value(SaveQuestionTimeRequest {
            question_id: 7,
            answer: "NOT GIVEN".into(),
            time_spent_seconds: 41,
        })
        .unwrap();
        assert_eq!(body["questionId"], 7);
        assert_eq!(body["timeSpentSeconds"], 41);
    }
}
