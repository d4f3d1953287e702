use std::sync::Arc;
use std::time::Duration;

use crate::{
    assets::decode::decode_source_image,
    assets::raster::PreparedImage,
    foundation::core::{DisplayMetrics, DisplayScale, FlipAxis},
    foundation::error::{DwiError, DwiResult},
    geometry::detector::FaceDetector,
    geometry::resolver::{SeededStylePicker, StylePicker, default_overlay, resolve_overlays},
    overlay::collection::OverlayCollection,
    overlay::model::{Overlay, OverlayId, StyleRef},
    render::composite::FrameRGBA,
    render::coordinator::{CoordinatorEvent, RenderCoordinator},
    render::frames::FramePlan,
    render::job::{ImageTransformOptions, RenderConfiguration, RenderJob},
    render::protocol::{JobId, RenderResult},
    render::worker::WorkerOpts,
    session::workflow::{Workflow, WorkflowEvent, WorkflowState},
    styles::catalog::StyleCatalog,
};

/// Warning shown when a supplied image cannot be used.
pub const LOAD_WARNING: &str = "The file could not be loaded - make sure it's a valid image file.";
/// Download name when the input name has no usable stem.
pub const FALLBACK_OUTPUT_NAME: &str = "dealwithit.gif";

const SUCCESS_MESSAGES: [&str; 5] = [
    "Deal with it!",
    "Now that's how you deal with it!",
    "Too cool for school.",
    "Shades on, problems off.",
    "Maximum coolness reached.",
];

/// `<input stem>-dealwithit.gif`, or [`FALLBACK_OUTPUT_NAME`].
pub fn output_filename(input_name: Option<&str>) -> String {
    input_name
        .and_then(|n| std::path::Path::new(n).file_stem())
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(|stem| format!("{stem}-dealwithit.gif"))
        .unwrap_or_else(|| FALLBACK_OUTPUT_NAME.to_string())
}

/// Result headline for the `success_count`-th completed render (1-based); rotates.
pub fn success_message(success_count: u64) -> &'static str {
    let i = success_count.saturating_sub(1) % SUCCESS_MESSAGES.len() as u64;
    SUCCESS_MESSAGES[i as usize]
}

#[derive(Clone, Debug, Default)]
pub struct SessionOpts {
    /// Seed for secondary-face style picks; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub worker: WorkerOpts,
    pub config: RenderConfiguration,
}

struct SourceImage {
    name: Option<String>,
    bytes: Arc<[u8]>,
    display: DisplayMetrics,
}

/// One interactive editing session: image intake, overlay editing, rendering, result.
///
/// Every method runs on the caller's thread; only rendering happens on the worker. Edits are
/// accepted in [`WorkflowState::Ready`] only and are silently ignored otherwise.
pub struct EditingSession {
    workflow: Workflow,
    overlays: OverlayCollection,
    image_options: ImageTransformOptions,
    option_edits: u64,
    config: RenderConfiguration,
    rendered_config: Option<RenderConfiguration>,
    source: Option<SourceImage>,
    warning: Option<String>,
    catalog: Arc<dyn StyleCatalog>,
    detector: Box<dyn FaceDetector>,
    picker: Box<dyn StylePicker + Send>,
    coordinator: RenderCoordinator,
}

impl EditingSession {
    /// Session with its own render worker thread.
    pub fn new(
        catalog: Arc<dyn StyleCatalog>,
        detector: Box<dyn FaceDetector>,
        opts: SessionOpts,
    ) -> DwiResult<Self> {
        opts.config.validate()?;
        let coordinator = RenderCoordinator::spawn(Arc::clone(&catalog), opts.worker)?;
        let picker: Box<dyn StylePicker + Send> = match opts.seed {
            Some(seed) => Box::new(SeededStylePicker::new(seed)),
            None => Box::new(SeededStylePicker::from_entropy()),
        };
        Ok(Self::with_parts(
            catalog,
            detector,
            picker,
            coordinator,
            opts.config,
        ))
    }

    pub fn with_parts(
        catalog: Arc<dyn StyleCatalog>,
        detector: Box<dyn FaceDetector>,
        picker: Box<dyn StylePicker + Send>,
        coordinator: RenderCoordinator,
        config: RenderConfiguration,
    ) -> Self {
        Self {
            workflow: Workflow::new(),
            overlays: OverlayCollection::new(),
            image_options: ImageTransformOptions::default(),
            option_edits: 0,
            config,
            rendered_config: None,
            source: None,
            warning: None,
            catalog,
            detector,
            picker,
            coordinator,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.workflow.state()
    }

    /// Last user-visible warning (failed intake).
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn catalog(&self) -> &dyn StyleCatalog {
        self.catalog.as_ref()
    }

    /// Load a PNG/JPEG image, detect faces and seed the overlays.
    ///
    /// `display` is the size the image is shown at (overlay coordinates live there); `None`
    /// means natural size. On a decode or detection failure the session returns to START with
    /// [`LOAD_WARNING`] set and the error is an [`DwiError::Input`].
    #[tracing::instrument(skip(self, bytes, display), fields(len = bytes.len()))]
    pub fn load_image(
        &mut self,
        name: Option<&str>,
        bytes: Vec<u8>,
        display: Option<DisplayMetrics>,
    ) -> DwiResult<WorkflowState> {
        if let Some(d) = display {
            d.validate()?;
        }
        self.workflow.apply(WorkflowEvent::ImageSupplied)?;
        self.warning = None;

        let prepared = match decode_source_image(&bytes) {
            Ok(p) => p,
            Err(e) => return Err(self.reject_image(WorkflowEvent::ImageRejected, e)),
        };
        self.workflow.apply(WorkflowEvent::ImageDecoded)?;
        self.image_options = ImageTransformOptions::default();

        let display =
            display.unwrap_or_else(|| DisplayMetrics::natural(prepared.width, prepared.height));
        let overlays = match self.initial_overlays(&prepared, display) {
            Ok(o) => o,
            Err(e) => return Err(self.reject_image(WorkflowEvent::DetectionFailed, e)),
        };

        self.overlays.replace_all(overlays);
        self.source = Some(SourceImage {
            name: name.map(str::to_string),
            bytes: Arc::from(bytes),
            display,
        });
        let state = self.workflow.apply(WorkflowEvent::FacesDetected)?;
        tracing::info!(
            width = prepared.width,
            height = prepared.height,
            overlays = self.overlays.len(),
            "image ready"
        );
        Ok(state)
    }

    fn initial_overlays(
        &mut self,
        image: &PreparedImage,
        display: DisplayMetrics,
    ) -> DwiResult<Vec<Overlay>> {
        let scale = DisplayScale::new(display, image.width, image.height)?;
        let faces = self.detector.detect(image)?;
        resolve_overlays(&faces, scale, self.catalog.as_ref(), self.picker.as_mut())
    }

    fn reject_image(&mut self, event: WorkflowEvent, err: DwiError) -> DwiError {
        tracing::warn!(error = %err, "image rejected");
        let _ = self.workflow.apply(event);
        self.clear_image();
        self.warning = Some(LOAD_WARNING.to_string());
        match err {
            DwiError::Input(_) => err,
            other => DwiError::input(other.to_string()),
        }
    }

    /// READY -> START, dropping the image and its overlays.
    pub fn remove_image(&mut self) -> bool {
        if self.workflow.apply(WorkflowEvent::ImageRemoved).is_err() {
            return false;
        }
        self.clear_image();
        true
    }

    /// Back to START from any state; an in-flight render is abandoned.
    pub fn reset(&mut self) {
        self.coordinator.abandon();
        let _ = self.workflow.apply(WorkflowEvent::Reset);
        self.clear_image();
        self.warning = None;
    }

    fn clear_image(&mut self) {
        self.source = None;
        self.overlays.clear();
        self.image_options = ImageTransformOptions::default();
        self.rendered_config = None;
    }

    pub fn overlays(&self) -> &OverlayCollection {
        &self.overlays
    }

    /// Mutable access to the overlays; `None` outside READY.
    pub fn edit(&mut self) -> Option<&mut OverlayCollection> {
        if self.workflow.can_edit() {
            Some(&mut self.overlays)
        } else {
            None
        }
    }

    /// Append a default overlay on top.
    pub fn add_overlay(&mut self) -> Option<OverlayId> {
        if !self.workflow.can_edit() {
            return None;
        }
        let overlay = default_overlay(self.catalog.as_ref(), None).ok()?;
        self.overlays.add(overlay)
    }

    /// Change an overlay's style; unknown styles are ignored.
    pub fn set_style(&mut self, id: OverlayId, style: StyleRef) -> bool {
        if !self.workflow.can_edit() || !self.catalog.contains(&style) {
            tracing::debug!(%style, "set_style ignored");
            return false;
        }
        self.overlays.set_style(id, style)
    }

    pub fn image_options(&self) -> ImageTransformOptions {
        self.image_options
    }

    pub fn toggle_image_flip(&mut self, axis: FlipAxis) -> bool {
        if !self.workflow.can_edit() {
            return false;
        }
        self.image_options.toggle(axis);
        self.option_edits = self.option_edits.wrapping_add(1);
        true
    }

    pub fn config(&self) -> &RenderConfiguration {
        &self.config
    }

    /// Render settings; `None` while a render is in flight. Validated at dispatch.
    pub fn config_mut(&mut self) -> Option<&mut RenderConfiguration> {
        if self.workflow.state() == WorkflowState::Generating {
            None
        } else {
            Some(&mut self.config)
        }
    }

    fn edit_revision(&self) -> u64 {
        self.overlays.revision().wrapping_add(self.option_edits)
    }

    fn snapshot(&self) -> Option<RenderJob> {
        let source = self.source.as_ref()?;
        let job = RenderJob::new(
            Arc::clone(&source.bytes),
            source.display,
            self.image_options,
            self.overlays.snapshot(),
            self.config,
        );
        Some(job.with_revision(self.edit_revision()))
    }

    /// Compose frame `index` of the current edit state on the caller's thread.
    pub fn preview_frame(&self, index: u32) -> DwiResult<FrameRGBA> {
        let job = self
            .snapshot()
            .ok_or_else(|| DwiError::validation("no image loaded"))?;
        job.validate()?;
        let plan = FramePlan::prepare(&job, self.catalog.as_ref())?;
        if index >= plan.frame_count() {
            return Err(DwiError::validation(format!(
                "frame {index} out of range (0..{})",
                plan.frame_count()
            )));
        }
        Ok(plan.compose(index))
    }

    /// Snapshot the current edit state and dispatch it. `None` (and no state change) unless
    /// READY with at least one overlay and a valid configuration.
    pub fn generate(&mut self) -> Option<JobId> {
        let job = self.snapshot()?;
        let id = self.coordinator.dispatch(&mut self.workflow, job)?;
        self.rendered_config = Some(self.config);
        Some(id)
    }

    /// Apply worker messages received so far.
    pub fn poll(&mut self) -> Vec<CoordinatorEvent> {
        self.coordinator.poll(&mut self.workflow)
    }

    /// Block until the in-flight render settles.
    pub fn wait(&mut self, timeout: Duration) -> DwiResult<&RenderResult> {
        self.coordinator.wait(&mut self.workflow, timeout)
    }

    pub fn cancel(&mut self) -> bool {
        self.coordinator.cancel(&mut self.workflow)
    }

    pub fn progress(&self) -> u8 {
        self.coordinator.progress()
    }

    /// Message of the last failed render, cleared by the next dispatch.
    pub fn render_error(&self) -> Option<&str> {
        self.coordinator.last_error()
    }

    /// DONE -> READY; the result stays available.
    pub fn dismiss_result(&mut self) -> bool {
        self.workflow.apply(WorkflowEvent::ResultDismissed).is_ok()
    }

    pub fn result(&self) -> Option<&RenderResult> {
        self.coordinator.result()
    }

    /// Whether the retained result still matches the current edits.
    pub fn result_is_current(&self) -> bool {
        self.result().is_some_and(|r| {
            r.revision == self.edit_revision() && self.rendered_config == Some(self.config)
        })
    }

    pub fn success_count(&self) -> u64 {
        self.coordinator.success_count()
    }

    /// Headline for the current result, while in DONE.
    pub fn success_message(&self) -> Option<&'static str> {
        (self.workflow.state() == WorkflowState::Done)
            .then(|| success_message(self.success_count()))
    }

    /// Output file name and GIF bytes of the retained result.
    pub fn download(&self) -> Option<(String, &[u8])> {
        let result = self.result()?;
        let name = self.source.as_ref().and_then(|s| s.name.as_deref());
        Some((output_filename(name), result.final_asset.as_slice()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
