use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::dto::attempt_dto::{ApiEnvelope, SaveProgressRequest, SaveQuestionTimeRequest};
use crate::error::{Error, Result};
use crate::models::question_time::QuestionTimeRecord;
use crate::models::test_attempt::TestAttempt;

/// Backend that owns attempt records. The session engine is its only client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttemptService: Send + Sync {
    /// Begins a new attempt or resumes the open one for this test.
    async fn start_attempt(&self, test_id: Uuid) -> Result<TestAttempt>;

    async fn save_progress(&self, attempt_id: Uuid, delta_seconds: u32) -> Result<()>;

    async fn save_question_time(&self, record: QuestionTimeRecord) -> Result<()>;

    async fn report_lost_focus(&self, attempt_id: Uuid) -> Result<()>;

    async fn submit_attempt(&self, attempt_id: Uuid) -> Result<()>;
}

#[derive(Clone)]
pub struct HttpAttemptService {
    client: Client,
    base_url: Url,
}

impl HttpAttemptService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized)?;

        let client = Client::builder().timeout(timeout).build()?;

        tracing::info!("Attempt service client targeting {}", base_url);
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn post<B, T>(&self, path: &str, body: Option<&B>) -> Result<Option<T>>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let mut request = self.client.post(url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<ApiEnvelope<T>>(&text) {
            Ok(envelope) => envelope.into_result(),
            Err(_) if !status.is_success() => {
                tracing::warn!(%url, status = status.as_u16(), "Attempt service returned a non-envelope error");
                Err(Error::upstream(format!("http_{}", status.as_u16()), text))
            }
            Err(e) => Err(Error::Json(e)),
        }
    }

    async fn post_void<B>(&self, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.post::<B, IgnoredAny>(path, body).await.map(|_| ())
    }
}

#[async_trait]
impl AttemptService for HttpAttemptService {
    async fn start_attempt(&self, test_id: Uuid) -> Result<TestAttempt> {
        let path = format!("tests/{}/attempts", test_id);
        self.post::<(), TestAttempt>(&path, None)
            .await?
            .ok_or_else(|| Error::upstream("empty_response", "Start attempt returned no attempt"))
    }

    async fn save_progress(&self, attempt_id: Uuid, delta_seconds: u32) -> Result<()> {
        let path = format!("attempts/{}/progress", attempt_id);
        self.post_void(&path, Some(&SaveProgressRequest { delta_seconds }))
            .await
    }

    async fn save_question_time(&self, record: QuestionTimeRecord) -> Result<()> {
        let path = format!("attempts/{}/question-time", record.attempt_id);
        let body = SaveQuestionTimeRequest {
            question_id: record.question_id,
            answer: record.answer,
            time_spent_seconds: record.time_spent_seconds,
        };
        self.post_void(&path, Some(&body)).await
    }

    async fn report_lost_focus(&self, attempt_id: Uuid) -> Result<()> {
        let path = format!("attempts/{}/lost-focus", attempt_id);
        self.post_void::<()>(&path, None).await
    }

    async fn submit_attempt(&self, attempt_id: Uuid) -> Result<()> {
        let path = format!("attempts/{}/submit", attempt_id);
        self.post_void::<()>(&path, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_a_trailing_slash() {
        let svc = HttpAttemptService::new("http://localhost:9000/api/v1", Duration::from_secs(5)).unwrap();
        let url = svc.endpoint("attempts/abc/submit").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/api/v1/attempts/abc/submit");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = HttpAttemptService::new("not a url", Duration::from_secs(5));
        assert!(matches!(result, Err(Error::Url(_))));
    }
}
