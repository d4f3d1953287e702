use crate::{
    foundation::error::DwiResult,
    render::composite::FrameRGBA,
    render::job::{LoopConfig, LoopMode},
};

/// How many times the animation plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Playback {
    Forever,
    /// Play this many times in total (always >= 1).
    Times(u16),
}

impl Playback {
    pub fn from_loop(looping: LoopConfig) -> Self {
        match looping.mode {
            LoopMode::Infinite => Self::Forever,
            LoopMode::Off => Self::Times(1),
            LoopMode::Finite => {
                Self::Times(u16::try_from(looping.count.max(1)).unwrap_or(u16::MAX))
            }
        }
    }
}

/// Configuration handed to a [`FrameSink`] before the first frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub playback: Playback,
}

/// Consumer of composed frames.
///
/// `push_frame` is called in strictly increasing frame order, between one `begin` and one `end`.
pub trait FrameSink: Send {
    fn begin(&mut self, cfg: SinkConfig) -> DwiResult<()>;
    fn push_frame(&mut self, index: u32, frame: &FrameRGBA, delay_ms: u32) -> DwiResult<()>;
    fn end(&mut self) -> DwiResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u32, FrameRGBA, u32)>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Captured `(index, frame, delay_ms)` triples.
    pub fn frames(&self) -> &[(u32, FrameRGBA, u32)] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> DwiResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, index: u32, frame: &FrameRGBA, delay_ms: u32) -> DwiResult<()> {
        self.frames.push((index, frame.clone(), delay_ms));
        Ok(())
    }

    fn end(&mut self) -> DwiResult<()> {
        self.finished = true;
        Ok(())
    }
}
