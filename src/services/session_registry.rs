use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::config::EngineSettings;
use crate::engine::session::{ExamSession, SessionHandle};
use crate::error::{Error, Result};
use crate::models::test::Test;
use crate::services::attempt_service::AttemptService;

/// Live sessions owned by this gateway, keyed by attempt id.
#[derive(Clone)]
pub struct SessionRegistry {
    service: Arc<dyn AttemptService>,
    settings: EngineSettings,
    sessions: Arc<Mutex<HashMap<Uuid, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new(service: Arc<dyn AttemptService>, settings: EngineSettings) -> Self {
        Self {
            service,
            settings,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Starts or resumes an attempt and spawns its engine. Returns the test
    /// with correct answers removed.
    ///
    /// The attempt id is only known once the attempt service answers, so the
    /// duplicate check runs after `start_attempt`. Resuming is idempotent
    /// upstream; a refused duplicate leaves the live session untouched.
    pub async fn start(&self, test_id: Uuid) -> Result<(SessionHandle, Test)> {
        let mut attempt = self.service.start_attempt(test_id).await?;
        let attempt_id = attempt.attempt_id;

        if attempt.is_finalized() {
            return Err(Error::Conflict(format!(
                "Attempt {} has already been submitted",
                attempt_id
            )));
        }

        attempt.test.redact_answers();
        let test = attempt.test.clone();

        let handle = {
            let mut sessions = self.sessions.lock().expect("session registry mutex poisoned");
            if sessions.get(&attempt_id).is_some_and(|h| !h.is_closed()) {
                return Err(Error::Conflict(format!(
                    "Attempt {} already has a live session",
                    attempt_id
                )));
            }
            let handle = ExamSession::spawn(attempt, Arc::clone(&self.service), self.settings.clone());
            sessions.insert(attempt_id, handle.clone());
            handle
        };

        self.remove_when_closed(handle.clone());
        tracing::info!(%attempt_id, %test_id, "Session registered");
        Ok((handle, test))
    }

    fn remove_when_closed(&self, handle: SessionHandle) {
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            handle.closed().await;
            let attempt_id = handle.attempt_id();
            if let Ok(mut sessions) = sessions.lock() {
                // A newer session for the same attempt may have replaced this one.
                if sessions.get(&attempt_id).is_some_and(|h| h.is_closed()) {
                    sessions.remove(&attempt_id);
                    tracing::debug!(%attempt_id, "Session removed from registry");
                }
            }
        });
    }

    pub fn get(&self, attempt_id: Uuid) -> Result<SessionHandle> {
        let sessions = self.sessions.lock().expect("session registry mutex poisoned");
        match sessions.get(&attempt_id) {
            Some(handle) if handle.is_closed() => Err(Error::SessionClosed),
            Some(handle) => Ok(handle.clone()),
            None => Err(Error::NotFound(format!("Session {} not found", attempt_id))),
        }
    }

    /// Navigation away: tears the session down without submitting.
    pub async fn dispose(&self, attempt_id: Uuid) -> Result<()> {
        let handle = self.get(attempt_id)?;
        match handle.dispose().await {
            Ok(()) | Err(Error::SessionClosed) => {}
            Err(e) => return Err(e),
        }
        self.sessions
            .lock()
            .expect("session registry mutex poisoned")
            .remove(&attempt_id);
        Ok(())
    }

    pub async fn dispose_all(&self) {
        let handles: Vec<SessionHandle> = {
            let mut sessions = self.sessions.lock().expect("session registry mutex poisoned");
            sessions.drain().map(|(_, handle)| handle).collect()
        };
        tracing::info!(count = handles.len(), "Disposing live sessions");
        for handle in handles {
            if let Err(e) = handle.dispose().await {
                tracing::debug!(attempt_id = %handle.attempt_id(), error = %e, "Session already closed");
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.sessions
            .lock()
            .expect("session registry mutex poisoned")
            .values()
            .filter(|handle| !handle.is_closed())
            .count()
    }
}
