use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::{
    foundation::error::{DwiError, DwiResult},
    render::job::RenderJob,
    render::protocol::{JobId, RenderResult, WorkerMessage, WorkerRequest},
    render::worker::{WorkerOpts, spawn_worker},
    session::workflow::{Workflow, WorkflowEvent, WorkflowState},
    styles::catalog::StyleCatalog,
};

/// What a poll/wait observed for the current job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorEvent {
    Progress(u8),
    Finished,
    Failed(String),
}

/// Interactive-side half of the worker boundary.
///
/// Dispatches validated job snapshots, forwards worker messages into the [`Workflow`], and
/// ignores every message that does not belong to the job currently in flight.
pub struct RenderCoordinator {
    requests: mpsc::Sender<WorkerRequest>,
    messages: mpsc::Receiver<WorkerMessage>,
    worker: Option<JoinHandle<()>>,
    next_job: u64,
    current: Option<JobId>,
    progress: u8,
    result: Option<RenderResult>,
    success_count: u64,
    last_error: Option<String>,
}

impl RenderCoordinator {
    pub fn spawn(catalog: Arc<dyn StyleCatalog>, opts: WorkerOpts) -> DwiResult<Self> {
        let handle = spawn_worker(catalog, opts)?;
        let mut out = Self::from_channels(handle.requests, handle.messages);
        out.worker = Some(handle.thread);
        Ok(out)
    }

    /// Coordinator over an externally driven worker.
    pub fn from_channels(
        requests: mpsc::Sender<WorkerRequest>,
        messages: mpsc::Receiver<WorkerMessage>,
    ) -> Self {
        Self {
            requests,
            messages,
            worker: None,
            next_job: 1,
            current: None,
            progress: 0,
            result: None,
            success_count: 0,
            last_error: None,
        }
    }

    /// Send `job` to the worker. A no-op returning `None` unless the workflow is READY and the
    /// job validates.
    pub fn dispatch(&mut self, workflow: &mut Workflow, job: RenderJob) -> Option<JobId> {
        if workflow.state() != WorkflowState::Ready {
            tracing::debug!(state = ?workflow.state(), "dispatch ignored: not ready");
            return None;
        }
        if let Err(e) = job.validate() {
            tracing::debug!(error = %e, "dispatch ignored: invalid job");
            return None;
        }

        let id = JobId(self.next_job);
        self.next_job += 1;
        let request = WorkerRequest::Render {
            job: id,
            payload: Box::new(job),
        };
        if self.requests.send(request).is_err() {
            tracing::warn!("dispatch failed: render worker is gone");
            self.last_error = Some("render worker is not running".to_string());
            return None;
        }
        workflow.apply(WorkflowEvent::RenderDispatched).ok()?;
        self.current = Some(id);
        self.progress = 0;
        self.last_error = None;
        tracing::info!(job = id.0, "render dispatched");
        Some(id)
    }

    /// Apply every message already received, without blocking.
    pub fn poll(&mut self, workflow: &mut Workflow) -> Vec<CoordinatorEvent> {
        let mut events = Vec::new();
        loop {
            match self.messages.try_recv() {
                Ok(msg) => events.extend(self.apply(workflow, msg)),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    events.extend(self.worker_lost(workflow));
                    break;
                }
            }
        }
        events
    }

    /// Block until the current job finishes, fails, or `timeout` elapses.
    pub fn wait(&mut self, workflow: &mut Workflow, timeout: Duration) -> DwiResult<&RenderResult> {
        let deadline = std::time::Instant::now() + timeout;
        while self.current.is_some() {
            let left = deadline.saturating_duration_since(std::time::Instant::now());
            if left.is_zero() {
                return Err(DwiError::render("timed out waiting for the render worker"));
            }
            match self.messages.recv_timeout(left) {
                Ok(msg) => {
                    if let Some(CoordinatorEvent::Failed(message)) = self.apply(workflow, msg) {
                        return Err(DwiError::render(message));
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    self.worker_lost(workflow);
                }
            }
        }
        match (&self.result, &self.last_error) {
            (Some(result), None) if workflow.state() == WorkflowState::Done => Ok(result),
            (_, Some(message)) => Err(DwiError::render(message.clone())),
            _ => Err(DwiError::validation("no render job in flight")),
        }
    }

    /// Abandon the job in flight: GENERATING returns to READY at once and any late messages of
    /// the job are dropped.
    pub fn cancel(&mut self, workflow: &mut Workflow) -> bool {
        let Some(job) = self.current else {
            return false;
        };
        let _ = self.requests.send(WorkerRequest::Cancel { job });
        self.current = None;
        self.progress = 0;
        if workflow.state() == WorkflowState::Generating {
            let _ = workflow.apply(WorkflowEvent::RenderCancelled);
        }
        tracing::info!(job = job.0, "render cancelled");
        true
    }

    /// Forget the in-flight job without touching the workflow (the session was reset).
    pub fn abandon(&mut self) {
        if let Some(job) = self.current.take() {
            let _ = self.requests.send(WorkerRequest::Cancel { job });
        }
        self.progress = 0;
        self.result = None;
        self.last_error = None;
    }

    /// Progress of the current job in `0..=100`; never decreases while the job runs.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn current_job(&self) -> Option<JobId> {
        self.current
    }

    pub fn result(&self) -> Option<&RenderResult> {
        self.result.as_ref()
    }

    /// Completed renders so far.
    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn apply(&mut self, workflow: &mut Workflow, msg: WorkerMessage) -> Option<CoordinatorEvent> {
        if self.current != Some(msg.job()) {
            tracing::debug!(job = msg.job().0, "dropping message for a stale job");
            return None;
        }
        match msg {
            WorkerMessage::Progress { percent, .. } => {
                let percent = percent.min(100).max(self.progress);
                if percent == self.progress {
                    return None;
                }
                self.progress = percent;
                Some(CoordinatorEvent::Progress(percent))
            }
            WorkerMessage::Finished { result, .. } => {
                self.current = None;
                self.progress = 100;
                workflow.apply(WorkflowEvent::RenderCompleted).ok()?;
                self.success_count += 1;
                self.result = Some(*result);
                tracing::info!(successes = self.success_count, "render completed");
                Some(CoordinatorEvent::Finished)
            }
            WorkerMessage::Failed { message, .. } => Some(self.fail(workflow, message)),
            WorkerMessage::Cancelled { .. } => {
                // Not requested by this side: the current job is always cleared before a cancel.
                Some(self.fail(workflow, "render was cancelled".to_string()))
            }
        }
    }

    fn fail(&mut self, workflow: &mut Workflow, message: String) -> CoordinatorEvent {
        tracing::warn!(%message, "render failed");
        self.current = None;
        self.progress = 0;
        let _ = workflow.apply(WorkflowEvent::RenderFailed);
        self.last_error = Some(message.clone());
        CoordinatorEvent::Failed(message)
    }

    fn worker_lost(&mut self, workflow: &mut Workflow) -> Option<CoordinatorEvent> {
        self.current?;
        Some(self.fail(workflow, "render worker disconnected".to_string()))
    }
}

impl Drop for RenderCoordinator {
    fn drop(&mut self) {
        let _ = self.requests.send(WorkerRequest::Shutdown);
        if let Some(thread) = self.worker.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/coordinator.rs"]
mod tests;
