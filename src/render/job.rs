use std::sync::Arc;

use crate::{
    animation::ease::Ease,
    foundation::core::{DisplayMetrics, FlipAxis},
    foundation::error::{DwiError, DwiResult},
    overlay::model::{Overlay, is_valid_size},
};

/// Largest accepted `output_max_dimension`.
pub const MAX_OUTPUT_DIMENSION: u32 = 16_384;
/// Largest accepted `frame_count`.
pub const MAX_FRAME_COUNT: u32 = 1_000;
/// Largest delay a GIF frame can carry (u16 centiseconds).
pub const MAX_FRAME_DELAY_MS: u32 = 655_350;
/// Smallest accepted final-frame delay.
pub const MIN_FINAL_FRAME_DELAY_MS: u32 = 10;

/// Whole-image mirror options, independent of per-overlay flips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageTransformOptions {
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl ImageTransformOptions {
    pub fn toggle(&mut self, axis: FlipAxis) {
        match axis {
            FlipAxis::Horizontal => self.flip_horizontal = !self.flip_horizontal,
            FlipAxis::Vertical => self.flip_vertical = !self.flip_vertical,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinalFrameDelay {
    pub enabled: bool,
    pub value_ms: u32,
}

impl Default for FinalFrameDelay {
    fn default() -> Self {
        Self {
            enabled: true,
            value_ms: 1000,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// Repeat forever.
    #[default]
    Infinite,
    /// Play once.
    Off,
    /// Play `count` times in total.
    Finite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoopConfig {
    pub mode: LoopMode,
    /// Total plays; only read when `mode` is [`LoopMode::Finite`].
    pub count: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            mode: LoopMode::Infinite,
            count: 5,
        }
    }
}

/// User-editable animation settings, validated before dispatch.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfiguration {
    pub frame_count: u32,
    pub frame_delay_ms: u32,
    pub final_frame_delay: FinalFrameDelay,
    #[serde(rename = "loop")]
    pub looping: LoopConfig,
    /// Larger of output width/height, in pixels.
    pub output_max_dimension: u32,
    /// Arrival curve.
    pub ease: Ease,
}

impl Default for RenderConfiguration {
    fn default() -> Self {
        Self {
            frame_count: 15,
            frame_delay_ms: 100,
            final_frame_delay: FinalFrameDelay::default(),
            looping: LoopConfig::default(),
            output_max_dimension: 160,
            ease: Ease::Linear,
        }
    }
}

impl RenderConfiguration {
    pub fn validate(&self) -> DwiResult<()> {
        if !(2..=MAX_FRAME_COUNT).contains(&self.frame_count) {
            return Err(DwiError::validation(format!(
                "frameCount must be within 2..={MAX_FRAME_COUNT}"
            )));
        }
        if self.frame_delay_ms > MAX_FRAME_DELAY_MS {
            return Err(DwiError::validation(format!(
                "frameDelayMs must be <= {MAX_FRAME_DELAY_MS}"
            )));
        }
        if !(MIN_FINAL_FRAME_DELAY_MS..=MAX_FRAME_DELAY_MS).contains(&self.final_frame_delay.value_ms)
        {
            return Err(DwiError::validation(format!(
                "finalFrameDelay.valueMs must be within {MIN_FINAL_FRAME_DELAY_MS}..={MAX_FRAME_DELAY_MS}"
            )));
        }
        if self.looping.mode == LoopMode::Finite
            && !(1..=u32::from(u16::MAX)).contains(&self.looping.count)
        {
            return Err(DwiError::validation(
                "loop.count must be within 1..=65535 when mode is finite",
            ));
        }
        if !(1..=MAX_OUTPUT_DIMENSION).contains(&self.output_max_dimension) {
            return Err(DwiError::validation(format!(
                "outputMaxDimension must be within 1..={MAX_OUTPUT_DIMENSION}"
            )));
        }
        Ok(())
    }

    /// Per-frame delays in milliseconds, last frame included.
    pub fn frame_delays(&self) -> Vec<u32> {
        let n = self.frame_count as usize;
        let mut delays = vec![self.frame_delay_ms; n];
        if self.final_frame_delay.enabled
            && let Some(last) = delays.last_mut()
        {
            *last = self.final_frame_delay.value_ms;
        }
        delays
    }
}

/// Immutable snapshot of everything one render needs.
///
/// Cheap to clone; later edits to the live session never reach a built job.
#[derive(Clone, Debug)]
pub struct RenderJob {
    source_image: Arc<[u8]>,
    display: DisplayMetrics,
    image_options: ImageTransformOptions,
    overlays: Arc<[Overlay]>,
    config: RenderConfiguration,
    revision: u64,
}

impl RenderJob {
    pub fn new(
        source_image: Arc<[u8]>,
        display: DisplayMetrics,
        image_options: ImageTransformOptions,
        overlays: Vec<Overlay>,
        config: RenderConfiguration,
    ) -> Self {
        Self {
            source_image,
            display,
            image_options,
            overlays: overlays.into(),
            config,
            revision: 0,
        }
    }

    /// Tag the job with the edit revision it was taken from.
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    pub fn source_image(&self) -> &[u8] {
        &self.source_image
    }

    pub fn display(&self) -> DisplayMetrics {
        self.display
    }

    pub fn image_options(&self) -> ImageTransformOptions {
        self.image_options
    }

    /// Overlays in stacking order (later entries on top).
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn config(&self) -> &RenderConfiguration {
        &self.config
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn validate(&self) -> DwiResult<()> {
        if self.overlays.is_empty() {
            return Err(DwiError::validation("render job needs at least one overlay"));
        }
        if self.source_image.is_empty() {
            return Err(DwiError::validation("render job has no source image"));
        }
        if let Some(o) = self.overlays.iter().find(|o| !is_valid_size(o.size())) {
            return Err(DwiError::validation(format!(
                "overlay {:?} has a non-positive size",
                o.id()
            )));
        }
        self.display.validate()?;
        self.config.validate()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/job.rs"]
mod tests;
