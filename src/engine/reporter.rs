use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::question_time::QuestionTimeRecord;
use crate::services::attempt_service::AttemptService;

/// Fire-and-continue persistence calls for one session.
#[derive(Debug)]
pub enum Report {
    Progress { delta_seconds: u32 },
    QuestionTime(QuestionTimeRecord),
    LostFocus,
    /// Resolves once every report queued before it has been delivered.
    Barrier(oneshot::Sender<()>),
}

/// Queue side of the report outbox. Reports are delivered in FIFO order by a
/// single worker task; failures are logged and dropped.
#[derive(Debug, Clone)]
pub struct Reporter {
    attempt_id: Uuid,
    tx: mpsc::UnboundedSender<Report>,
}

impl Reporter {
    pub fn spawn(attempt_id: Uuid, service: Arc<dyn AttemptService>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_reporter(attempt_id, service, rx));
        (Self { attempt_id, tx }, worker)
    }

    pub fn send(&self, report: Report) {
        if self.tx.send(report).is_err() {
            tracing::error!(attempt_id = %self.attempt_id, "Report outbox is closed; report dropped");
        }
    }

    /// Queues a barrier behind everything sent so far.
    pub fn barrier(&self) -> oneshot::Receiver<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(Report::Barrier(done_tx));
        done_rx
    }
}

async fn run_reporter(
    attempt_id: Uuid,
    service: Arc<dyn AttemptService>,
    mut rx: mpsc::UnboundedReceiver<Report>,
) {
    while let Some(report) = rx.recv().await {
        match report {
            Report::Progress { delta_seconds } => {
                if let Err(e) = service.save_progress(attempt_id, delta_seconds).await {
                    tracing::warn!(%attempt_id, delta_seconds, error = %e, "Autosave failed; next tick will carry on");
                }
            }
            Report::QuestionTime(record) => {
                let question_id = record.question_id;
                let seconds = record.time_spent_seconds;
                if let Err(e) = service.save_question_time(record).await {
                    tracing::warn!(%attempt_id, question_id, seconds, error = %e, "Question time was not saved");
                }
            }
            Report::LostFocus => {
                if let Err(e) = service.report_lost_focus(attempt_id).await {
                    tracing::warn!(%attempt_id, error = %e, "Lost-focus report was not delivered");
                }
            }
            Report::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!(%attempt_id, "Report outbox drained");
}
