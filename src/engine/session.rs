//! The exam attempt session engine.
//!
//! One actor task per session owns every component (clock, autosave,
//! per-question timer, integrity watchers, submission guard) and processes
//! their callbacks one at a time. Callers talk to it through a cloneable
//! [`SessionHandle`], which is the session context: once the actor stops,
//! every timer and watcher it owned is gone with it.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::EngineSettings;
use crate::engine::answer_store::AnswerStore;
use crate::engine::autosave::AutosaveScheduler;
use crate::engine::clock::{ClockTick, SessionClock};
use crate::engine::integrity::{FocusState, FullscreenStatus, IntegrityEvent, IntegrityMonitor};
use crate::engine::modality::{LayoutArea, Modality, ModalityKind, QuestionRenderer, RenderMode};
use crate::engine::question_timer::QuestionTimer;
use crate::engine::reporter::{Report, Reporter};
use crate::engine::submission::{SubmissionController, SubmissionPhase, SubmitTrigger};
use crate::error::{Error, Result};
use crate::models::question::QuestionId;
use crate::models::test_attempt::TestAttempt;
use crate::services::attempt_service::AttemptService;
use crate::utils::time::now;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    AwaitingFullscreen,
    Active,
    Submitting,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoticeKind {
    FullscreenRequired,
    FullscreenExited,
    FocusReturned { reports: u32 },
    TimeExpired,
    SubmissionFailed { message: String },
}

/// Candidate-facing message raised by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    #[serde(flatten)]
    pub kind: NoticeKind,
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub attempt_id: Uuid,
    pub attempt_number: i32,
    pub test_title: String,
    pub modality: ModalityKind,
    pub layout: Vec<LayoutArea>,
    pub question_renderer: QuestionRenderer,
    pub mode: RenderMode,
    pub phase: SessionPhase,
    pub time_left_seconds: u32,
    pub answers: BTreeMap<QuestionId, String>,
    pub answered_questions: usize,
    pub total_questions: usize,
    pub active_question: Option<QuestionId>,
    pub lost_focus_reports: u32,
    pub fullscreen: FullscreenStatus,
    pub focus: FocusState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub attempt_id: Uuid,
    pub trigger: SubmitTrigger,
}

enum Command {
    AcknowledgeFullscreen {
        entered: bool,
        reply: oneshot::Sender<()>,
    },
    FullscreenChanged {
        in_fullscreen: bool,
        reply: oneshot::Sender<()>,
    },
    WindowBlurred {
        reply: oneshot::Sender<()>,
    },
    WindowFocused {
        reply: oneshot::Sender<()>,
    },
    AnswerChanged {
        question_id: QuestionId,
        value: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Submit {
        reply: oneshot::Sender<Result<SubmitOutcome>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    DrainNotices {
        reply: oneshot::Sender<Vec<Notice>>,
    },
    Dispose {
        reply: oneshot::Sender<()>,
    },
}

struct SubmissionFinished {
    trigger: SubmitTrigger,
    result: Result<()>,
}

enum Flow {
    Continue,
    Stop,
}

/// Cloneable handle to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    attempt_id: Uuid,
    commands: mpsc::Sender<Command>,
    finished: CancellationToken,
}

impl SessionHandle {
    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn is_closed(&self) -> bool {
        self.finished.is_cancelled() || self.commands.is_closed()
    }

    /// Resolves once the actor and its report outbox have both stopped.
    pub async fn closed(&self) {
        self.finished.cancelled().await
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| Error::SessionClosed)?;
        response.await.map_err(|_| Error::SessionClosed)
    }

    /// Answers the blocking fullscreen prompt. `entered = false` records that
    /// the browser refused; the exam then continues without enforcement.
    pub async fn acknowledge_fullscreen(&self, entered: bool) -> Result<()> {
        self.request(|reply| Command::AcknowledgeFullscreen { entered, reply })
            .await
    }

    pub async fn fullscreen_changed(&self, in_fullscreen: bool) -> Result<()> {
        self.request(|reply| Command::FullscreenChanged {
            in_fullscreen,
            reply,
        })
        .await
    }

    pub async fn window_blurred(&self) -> Result<()> {
        self.request(|reply| Command::WindowBlurred { reply }).await
    }

    pub async fn window_focused(&self) -> Result<()> {
        self.request(|reply| Command::WindowFocused { reply }).await
    }

    /// The uniform change handler bound to every question widget.
    pub async fn answer_changed(&self, question_id: QuestionId, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.request(|reply| Command::AnswerChanged {
            question_id,
            value,
            reply,
        })
        .await?
    }

    /// Manual submission. Resolves when the attempt service has answered.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        self.request(|reply| Command::Submit { reply }).await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn drain_notices(&self) -> Result<Vec<Notice>> {
        self.request(|reply| Command::DrainNotices { reply }).await
    }

    /// Ends the session without submitting, e.g. when the candidate
    /// navigates away. Pending reports are delivered before this returns.
    pub async fn dispose(&self) -> Result<()> {
        self.request(|reply| Command::Dispose { reply }).await
    }
}

pub struct ExamSession;

impl ExamSession {
    /// Spawns the engine for an attempt the attempt service has started or
    /// resumed.
    pub fn spawn(
        attempt: TestAttempt,
        service: Arc<dyn AttemptService>,
        settings: EngineSettings,
    ) -> SessionHandle {
        let attempt_id = attempt.attempt_id;

        let (commands_tx, commands_rx) = mpsc::channel(settings.command_buffer.max(1));
        let (submissions_tx, submissions_rx) = mpsc::unbounded_channel();
        let (reporter, reporter_worker) = Reporter::spawn(attempt_id, Arc::clone(&service));
        let finished = CancellationToken::new();

        let engine = SessionEngine {
            modality: attempt.test.modality.strategy(),
            clock: SessionClock::new(attempt.test.duration_minutes, attempt.total_time_spent),
            autosave: AutosaveScheduler::new(settings.autosave_interval),
            timer: QuestionTimer::new(attempt_id),
            answers: AnswerStore::new(),
            integrity: IntegrityMonitor::default(),
            controller: SubmissionController::default(),
            notices: VecDeque::new(),
            pending_submit: None,
            dispose_replies: Vec::new(),
            dispose_requested: false,
            attempt,
            service,
            settings,
            reporter,
            submissions_tx,
        };

        tokio::spawn(engine.run(commands_rx, submissions_rx, reporter_worker, finished.clone()));

        SessionHandle {
            attempt_id,
            commands: commands_tx,
            finished,
        }
    }
}

struct SessionEngine {
    attempt: TestAttempt,
    modality: Arc<dyn Modality>,
    service: Arc<dyn AttemptService>,
    settings: EngineSettings,
    answers: AnswerStore,
    timer: QuestionTimer,
    clock: SessionClock,
    autosave: AutosaveScheduler,
    integrity: IntegrityMonitor,
    controller: SubmissionController,
    reporter: Reporter,
    notices: VecDeque<Notice>,
    pending_submit: Option<oneshot::Sender<Result<SubmitOutcome>>>,
    dispose_replies: Vec<oneshot::Sender<()>>,
    /// Teardown was asked for while a submission was in flight.
    dispose_requested: bool,
    submissions_tx: mpsc::UnboundedSender<SubmissionFinished>,
}

impl SessionEngine {
    fn attempt_id(&self) -> Uuid {
        self.attempt.attempt_id
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut submissions: mpsc::UnboundedReceiver<SubmissionFinished>,
        reporter_worker: JoinHandle<()>,
        finished: CancellationToken,
    ) {
        let attempt_id = self.attempt_id();
        tracing::info!(
            %attempt_id,
            modality = ?self.modality.kind(),
            time_left = self.clock.time_left(),
            "Exam session started"
        );

        // Both schedules are created once and live as long as the session.
        let started = Instant::now();
        let tick = self.settings.tick;
        let mut clock_ticks = interval_at(started + tick, tick);
        let autosave_period = self.autosave.interval();
        let mut autosave_ticks = interval_at(started + autosave_period, autosave_period);
        autosave_ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.autosave.start();
        self.raise(NoticeKind::FullscreenRequired);

        if self.clock.expired_on_start() {
            tracing::warn!(%attempt_id, "No time left on resume; submitting immediately");
            self.on_time_up();
        }

        let mut handles_alive = true;
        loop {
            let flow = tokio::select! {
                command = commands.recv(), if handles_alive => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        tracing::info!(%attempt_id, "Every session handle was dropped");
                        handles_alive = false;
                        self.request_teardown()
                    }
                },
                Some(done) = submissions.recv() => self.finish_submission(done),
                _ = clock_ticks.tick(), if self.clock.is_running() => {
                    self.on_clock_tick();
                    Flow::Continue
                }
                _ = autosave_ticks.tick(), if self.autosave.is_running() => {
                    self.on_autosave_tick();
                    Flow::Continue
                }
            };

            if let Flow::Stop = flow {
                break;
            }
        }

        // Late commands fail with SessionClosed instead of waiting on the drain.
        drop(commands);
        let dispose_replies = std::mem::take(&mut self.dispose_replies);
        // Dropping the engine closes the outbox queue; the worker drains it.
        drop(self);
        if let Err(e) = reporter_worker.await {
            tracing::error!(%attempt_id, error = ?e, "Report outbox task failed");
        }
        finished.cancel();
        for reply in dispose_replies {
            let _ = reply.send(());
        }
        tracing::info!(%attempt_id, "Exam session closed");
    }

    fn handle_command(&mut self, command: Command) -> Flow {
        match command {
            Command::AcknowledgeFullscreen { entered, reply } => {
                if self.integrity.acknowledge_fullscreen(entered) {
                    if entered {
                        tracing::info!(attempt_id = %self.attempt_id(), "Fullscreen gate satisfied");
                    } else {
                        tracing::warn!(
                            attempt_id = %self.attempt_id(),
                            "Fullscreen refused by the browser; continuing without enforcement"
                        );
                    }
                }
                let _ = reply.send(());
            }
            Command::FullscreenChanged {
                in_fullscreen,
                reply,
            } => {
                if let Some(event) = self.integrity.on_fullscreen_change(in_fullscreen) {
                    self.apply_integrity(event);
                }
                let _ = reply.send(());
            }
            Command::WindowBlurred { reply } => {
                if let Some(event) = self.integrity.on_blur() {
                    self.apply_integrity(event);
                }
                let _ = reply.send(());
            }
            Command::WindowFocused { reply } => {
                if let Some(event) = self.integrity.on_focus() {
                    self.apply_integrity(event);
                }
                let _ = reply.send(());
            }
            Command::AnswerChanged {
                question_id,
                value,
                reply,
            } => {
                let _ = reply.send(self.on_answer_change(question_id, value));
            }
            Command::Submit { reply } => {
                self.begin_submission(SubmitTrigger::Manual, Some(reply));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::DrainNotices { reply } => {
                let _ = reply.send(self.notices.drain(..).collect());
            }
            Command::Dispose { reply } => {
                self.dispose_replies.push(reply);
                return self.request_teardown();
            }
        }
        Flow::Continue
    }

    fn on_answer_change(&mut self, question_id: QuestionId, value: String) -> Result<()> {
        if !self.integrity.is_gate_satisfied() {
            return Err(Error::Conflict(
                "Fullscreen prompt has not been answered yet".to_string(),
            ));
        }
        if !self.controller.is_active() {
            return Err(Error::Conflict("Submission in progress".to_string()));
        }
        if self.clock.is_expired() {
            return Err(Error::Conflict("Time is up; the attempt can only be submitted".to_string()));
        }
        if !self.attempt.test.contains_question(question_id) {
            return Err(Error::BadRequest(format!(
                "Question {} is not part of this test",
                question_id
            )));
        }

        let record =
            self.timer
                .on_answer_change(&mut self.answers, question_id, value, Instant::now());
        if let Some(record) = record {
            tracing::debug!(
                attempt_id = %self.attempt_id(),
                question_id = record.question_id,
                seconds = record.time_spent_seconds,
                "Question interval closed"
            );
            self.reporter.send(Report::QuestionTime(record));
        }
        Ok(())
    }

    fn apply_integrity(&mut self, event: IntegrityEvent) {
        let attempt_id = self.attempt_id();
        match event {
            IntegrityEvent::ReportLostFocus { reports } => {
                tracing::warn!(%attempt_id, reports, "Candidate left the exam window");
                self.reporter.send(Report::LostFocus);
                if let Some(limit) = self.settings.focus_violation_limit {
                    if reports >= limit {
                        tracing::warn!(%attempt_id, reports, limit, "Focus violation limit reached");
                        self.begin_submission(SubmitTrigger::ViolationLimit, None);
                    }
                }
            }
            IntegrityEvent::WarnFocusReturned => {
                let reports = self.integrity.lost_focus_reports();
                self.raise(NoticeKind::FocusReturned { reports });
            }
            IntegrityEvent::WarnFullscreenExited => {
                tracing::info!(%attempt_id, "Candidate left fullscreen");
                self.raise(NoticeKind::FullscreenExited);
            }
        }
    }

    fn on_clock_tick(&mut self) {
        if let ClockTick::Expired = self.clock.tick() {
            tracing::info!(attempt_id = %self.attempt_id(), "Time is up; forcing submission");
            self.on_time_up();
        }
    }

    /// No time may be reported past the limit, so the heartbeat stops here
    /// even if the forced submission later fails.
    fn on_time_up(&mut self) {
        self.autosave.cancel();
        self.raise(NoticeKind::TimeExpired);
        self.begin_submission(SubmitTrigger::Timeout, None);
    }

    fn on_autosave_tick(&mut self) {
        if let Some(delta_seconds) = self.autosave.on_tick() {
            self.reporter.send(Report::Progress { delta_seconds });
        }
    }

    /// Final flush, then the submit call once the outbox has delivered it.
    fn begin_submission(
        &mut self,
        trigger: SubmitTrigger,
        reply: Option<oneshot::Sender<Result<SubmitOutcome>>>,
    ) {
        let attempt_id = self.attempt_id();
        if let Err(rejected) = self.controller.begin(trigger) {
            tracing::debug!(%attempt_id, ?trigger, %rejected, "Submit request ignored");
            if let Some(reply) = reply {
                let _ = reply.send(Err(rejected.into()));
            }
            return;
        }

        tracing::info!(%attempt_id, ?trigger, "Submitting attempt");
        if let Some(record) = self.timer.flush(&self.answers, Instant::now()) {
            self.reporter.send(Report::QuestionTime(record));
        }
        let flushed = self.reporter.barrier();
        self.pending_submit = reply;

        let service = Arc::clone(&self.service);
        let done = self.submissions_tx.clone();
        tokio::spawn(async move {
            if flushed.await.is_err() {
                tracing::warn!(%attempt_id, "Report outbox closed before the final flush");
            }
            let result = service.submit_attempt(attempt_id).await;
            let _ = done.send(SubmissionFinished { trigger, result });
        });
    }

    fn finish_submission(&mut self, done: SubmissionFinished) -> Flow {
        let attempt_id = self.attempt_id();
        let reply = self.pending_submit.take();
        match done.result {
            Ok(()) => {
                self.controller.succeed();
                self.shutdown();
                self.answers.clear();
                tracing::info!(%attempt_id, trigger = ?done.trigger, "Attempt submitted");
                if let Some(reply) = reply {
                    let _ = reply.send(Ok(SubmitOutcome {
                        attempt_id,
                        trigger: done.trigger,
                    }));
                }
                Flow::Stop
            }
            Err(e) => {
                self.controller.fail();
                tracing::error!(
                    %attempt_id,
                    trigger = ?done.trigger,
                    failures = self.controller.failures(),
                    error = %e,
                    "Submission failed; session stays open"
                );
                if done.trigger.is_forced() {
                    tracing::warn!(%attempt_id, "Forced submission was not accepted; waiting for a manual retry");
                }
                self.raise(NoticeKind::SubmissionFailed {
                    message: e.to_string(),
                });
                if let Some(reply) = reply {
                    let _ = reply.send(Err(e));
                }
                if self.dispose_requested {
                    self.teardown_without_submit();
                    return Flow::Stop;
                }
                Flow::Continue
            }
        }
    }

    /// Navigation away. An in-flight submission is allowed to finish first so
    /// its caller learns the real outcome.
    fn request_teardown(&mut self) -> Flow {
        if let SubmissionPhase::Submitting(trigger) = self.controller.phase() {
            tracing::info!(
                attempt_id = %self.attempt_id(),
                ?trigger,
                "Teardown deferred until the in-flight submission completes"
            );
            self.dispose_requested = true;
            return Flow::Continue;
        }
        self.teardown_without_submit();
        Flow::Stop
    }

    fn teardown_without_submit(&mut self) {
        let attempt_id = self.attempt_id();
        if let Some(record) = self.timer.finish(&self.answers, Instant::now()) {
            self.reporter.send(Report::QuestionTime(record));
        }
        self.shutdown();
        tracing::info!(%attempt_id, "Exam session disposed without submission");
    }

    fn shutdown(&mut self) {
        self.clock.stop();
        self.autosave.cancel();
        self.integrity.detach();
    }

    fn raise(&mut self, kind: NoticeKind) {
        self.notices.push_back(Notice {
            kind,
            raised_at: now(),
        });
        while self.notices.len() > self.settings.notice_capacity.max(1) {
            self.notices.pop_front();
        }
    }

    fn phase(&self) -> SessionPhase {
        match self.controller.phase() {
            SubmissionPhase::Terminated => SessionPhase::Terminated,
            SubmissionPhase::Submitting(_) => SessionPhase::Submitting,
            SubmissionPhase::Active if !self.integrity.is_gate_satisfied() => {
                SessionPhase::AwaitingFullscreen
            }
            SubmissionPhase::Active => SessionPhase::Active,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            attempt_id: self.attempt_id(),
            attempt_number: self.attempt.attempt_number,
            test_title: self.attempt.test.title.clone(),
            modality: self.modality.kind(),
            layout: self.modality.layout().to_vec(),
            question_renderer: self.modality.question_renderer(),
            mode: RenderMode::Exam,
            phase: self.phase(),
            time_left_seconds: self.clock.time_left(),
            answers: self.answers.snapshot(),
            answered_questions: self.answers.answered_count(),
            total_questions: self.attempt.test.questions.len(),
            active_question: self.timer.active_question(),
            lost_focus_reports: self.integrity.lost_focus_reports(),
            fullscreen: self.integrity.fullscreen_status(),
            focus: self.integrity.focus_state(),
        }
    }
}
