use crate::render::job::RenderJob;

/// Identity of one dispatched render. Allocated by the coordinator, strictly increasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u64);

/// Finished render handed back across the worker boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderResult {
    /// Encoded GIF bytes.
    pub final_asset: Vec<u8>,
    /// `data:image/gif;base64,...` of the same bytes.
    pub preview_data_url: String,
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    /// Edit revision the job snapshot was taken at.
    pub revision: u64,
}

/// Interactive side to worker.
#[derive(Debug)]
pub enum WorkerRequest {
    Render { job: JobId, payload: Box<RenderJob> },
    /// Abandon `job` if it is still running.
    Cancel { job: JobId },
    Shutdown,
}

/// Worker to interactive side. Every message names the job it belongs to.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Completion percentage in `0..=100`.
    Progress { job: JobId, percent: u8 },
    Finished { job: JobId, result: Box<RenderResult> },
    Failed { job: JobId, message: String },
    Cancelled { job: JobId },
}

impl WorkerMessage {
    pub fn job(&self) -> JobId {
        match self {
            Self::Progress { job, .. }
            | Self::Finished { job, .. }
            | Self::Failed { job, .. }
            | Self::Cancelled { job } => *job,
        }
    }

    /// Whether no further messages follow for this job.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}
