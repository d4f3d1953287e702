use std::collections::VecDeque;
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;

use anyhow::Context;
use rayon::prelude::*;

use crate::{
    encode::gif::{GifSink, gif_data_url},
    encode::sink::{FrameSink, Playback, SinkConfig},
    foundation::error::{DwiError, DwiResult},
    render::composite::FrameRGBA,
    render::frames::FramePlan,
    render::job::RenderJob,
    render::protocol::{JobId, RenderResult, WorkerMessage, WorkerRequest},
    styles::catalog::StyleCatalog,
};

/// Progress is reported in steps of this many percent, plus a final 100.
pub const PROGRESS_STEP: u8 = 5;

/// Worker threading/chunking configuration.
#[derive(Clone, Debug)]
pub struct WorkerOpts {
    /// Frames composed in parallel per chunk; cancellation is checked between chunks.
    pub chunk_size: usize,
    /// Rayon pool size; `None` uses rayon's default.
    pub threads: Option<usize>,
}

impl Default for WorkerOpts {
    fn default() -> Self {
        Self {
            chunk_size: 8,
            threads: None,
        }
    }
}

/// Channels and thread of a running worker.
pub struct WorkerHandle {
    pub requests: mpsc::Sender<WorkerRequest>,
    pub messages: mpsc::Receiver<WorkerMessage>,
    pub thread: JoinHandle<()>,
}

/// Start the render worker on its own thread.
pub fn spawn_worker(catalog: Arc<dyn StyleCatalog>, opts: WorkerOpts) -> DwiResult<WorkerHandle> {
    let pool = build_thread_pool(opts.threads)?;
    let (req_tx, req_rx) = mpsc::channel();
    let (msg_tx, msg_rx) = mpsc::channel();
    let chunk_size = opts.chunk_size.max(1) as u32;

    let thread = std::thread::Builder::new()
        .name("dealwithit-render".to_string())
        .spawn(move || {
            Worker {
                catalog,
                pool,
                chunk_size,
                requests: req_rx,
                messages: msg_tx,
                backlog: VecDeque::new(),
            }
            .run();
        })
        .context("spawn render worker thread")?;

    Ok(WorkerHandle {
        requests: req_tx,
        messages: msg_rx,
        thread,
    })
}

fn build_thread_pool(threads: Option<usize>) -> DwiResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(DwiError::validation(
            "worker 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| DwiError::render(format!("failed to build rayon thread pool: {e}")))
}

enum JobOutcome {
    Finished(RenderResult),
    Cancelled,
    Shutdown,
}

struct Worker {
    catalog: Arc<dyn StyleCatalog>,
    pool: rayon::ThreadPool,
    chunk_size: u32,
    requests: mpsc::Receiver<WorkerRequest>,
    messages: mpsc::Sender<WorkerMessage>,
    /// Requests read while a job was running that still need handling.
    backlog: VecDeque<WorkerRequest>,
}

impl Worker {
    fn run(mut self) {
        tracing::debug!("render worker started");
        loop {
            let request = match self.backlog.pop_front() {
                Some(r) => r,
                None => match self.requests.recv() {
                    Ok(r) => r,
                    Err(_) => break,
                },
            };
            match request {
                WorkerRequest::Shutdown => break,
                WorkerRequest::Cancel { job } => {
                    tracing::debug!(job = job.0, "cancel for a job that is not running");
                }
                WorkerRequest::Render { job, payload } => {
                    if !self.handle_render(job, &payload) {
                        break;
                    }
                }
            }
        }
        tracing::debug!("render worker stopped");
    }

    /// Returns `false` when the worker should stop.
    fn handle_render(&mut self, job: JobId, payload: &RenderJob) -> bool {
        let mut progress = ProgressReporter::new(job);
        progress.start(&self.messages);

        // A panic in compositing fails this job only; the worker keeps serving requests.
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.run_job(job, payload, &mut progress)
        }))
        .unwrap_or_else(|panic| {
            Err(DwiError::render(format!(
                "render panicked: {}",
                panic_message(panic.as_ref())
            )))
        });

        let message = match outcome {
            Ok(JobOutcome::Finished(result)) => {
                progress.finish(&self.messages);
                WorkerMessage::Finished {
                    job,
                    result: Box::new(result),
                }
            }
            Ok(JobOutcome::Cancelled) => WorkerMessage::Cancelled { job },
            Ok(JobOutcome::Shutdown) => return false,
            Err(e) => {
                tracing::warn!(job = job.0, error = %e, "render failed");
                WorkerMessage::Failed {
                    job,
                    message: e.to_string(),
                }
            }
        };
        self.messages.send(message).is_ok()
    }

    #[tracing::instrument(skip(self, job, payload, progress), fields(job = job.0))]
    fn run_job(
        &mut self,
        job: JobId,
        payload: &RenderJob,
        progress: &mut ProgressReporter,
    ) -> DwiResult<JobOutcome> {
        payload.validate()?;
        let plan = FramePlan::prepare(payload, self.catalog.as_ref())?;
        let config = payload.config();
        let frame_count = plan.frame_count();
        let delays = config.frame_delays();
        progress.set_total(u64::from(frame_count) * 2);

        let mut bytes = Vec::new();
        {
            let mut sink = GifSink::new(&mut bytes);
            sink.begin(SinkConfig {
                width: plan.width(),
                height: plan.height(),
                frame_count,
                playback: Playback::from_loop(config.looping),
            })?;

            let mut start = 0u32;
            while start < frame_count {
                if let Some(outcome) = self.interruption(job) {
                    tracing::debug!(frame = start, "render interrupted");
                    return Ok(outcome);
                }
                let end = start.saturating_add(self.chunk_size).min(frame_count);
                let plan_ref = &plan;
                let frames: Vec<FrameRGBA> = self
                    .pool
                    .install(|| (start..end).into_par_iter().map(|i| plan_ref.compose(i)).collect());
                progress.advance(frames.len() as u64, &self.messages);

                for (i, frame) in (start..end).zip(frames.iter()) {
                    sink.push_frame(i, frame, delays[i as usize])?;
                    progress.advance(1, &self.messages);
                }
                start = end;
            }
            sink.end()?;
        }

        tracing::info!(
            width = plan.width(),
            height = plan.height(),
            frames = frame_count,
            bytes = bytes.len(),
            "render finished"
        );
        Ok(JobOutcome::Finished(RenderResult {
            preview_data_url: gif_data_url(&bytes),
            final_asset: bytes,
            width: plan.width(),
            height: plan.height(),
            frame_count,
            revision: payload.revision(),
        }))
    }

    /// Drain pending requests; report a cancel for `job` or a shutdown.
    fn interruption(&mut self, job: JobId) -> Option<JobOutcome> {
        loop {
            match self.requests.try_recv() {
                Ok(WorkerRequest::Cancel { job: cancelled }) if cancelled == job => {
                    return Some(JobOutcome::Cancelled);
                }
                Ok(WorkerRequest::Cancel { job: other }) => {
                    tracing::debug!(job = other.0, "ignoring cancel for another job");
                }
                Ok(WorkerRequest::Shutdown) => return Some(JobOutcome::Shutdown),
                Ok(request @ WorkerRequest::Render { .. }) => self.backlog.push_back(request),
                Err(mpsc::TryRecvError::Empty) => return None,
                Err(mpsc::TryRecvError::Disconnected) => return Some(JobOutcome::Shutdown),
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Emits bounded, monotonic progress for one job.
struct ProgressReporter {
    job: JobId,
    total: u64,
    done: u64,
    last: Option<u8>,
}

impl ProgressReporter {
    fn new(job: JobId) -> Self {
        Self {
            job,
            total: 1,
            done: 0,
            last: None,
        }
    }

    fn set_total(&mut self, total: u64) {
        self.total = total.max(1);
    }

    fn start(&mut self, tx: &mpsc::Sender<WorkerMessage>) {
        self.emit(0, tx);
    }

    fn advance(&mut self, units: u64, tx: &mpsc::Sender<WorkerMessage>) {
        self.done = (self.done + units).min(self.total);
        // 100 is reserved for a finished render.
        let percent = (self.done * 100 / self.total).min(99) as u8;
        self.emit(percent / PROGRESS_STEP * PROGRESS_STEP, tx);
    }

    fn finish(&mut self, tx: &mpsc::Sender<WorkerMessage>) {
        self.emit(100, tx);
    }

    fn emit(&mut self, percent: u8, tx: &mpsc::Sender<WorkerMessage>) {
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }
        self.last = Some(percent);
        let _ = tx.send(WorkerMessage::Progress {
            job: self.job,
            percent,
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/worker.rs"]
mod tests;
