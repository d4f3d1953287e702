//! Dealwithit anchors sunglasses overlays onto detected faces in a still image and renders the
//! "deal with it" arrival animation as a looping GIF.
//!
//! The public API is session-oriented:
//!
//! - Create an [`EditingSession`] with a [`StyleCatalog`] and a [`FaceDetector`]
//! - Load an image; overlays are placed from the detected faces
//! - Edit the [`OverlayCollection`], then [`generate`](EditingSession::generate) and collect the
//!   [`RenderResult`] produced by the render worker
#![forbid(unsafe_code)]

pub mod animation;
pub mod assets;
pub mod encode;
pub mod foundation;
pub mod geometry;
pub mod overlay;
pub mod render;
pub mod session;
pub mod styles;

pub use crate::foundation::core::{DisplayMetrics, DisplayScale, FlipAxis, Point, Size, Vec2};
pub use crate::foundation::error::{DwiError, DwiResult};

pub use crate::animation::ease::Ease;
pub use crate::assets::raster::PreparedImage;
pub use crate::encode::gif::{GifSink, encode_gif, gif_data_url};
pub use crate::encode::sink::{FrameSink, InMemorySink, Playback, SinkConfig};
pub use crate::geometry::detector::{FaceDetector, StaticDetector};
pub use crate::geometry::keypoints::DetectedFace;
pub use crate::geometry::resolver::{SeededStylePicker, StylePicker, resolve_overlays};
pub use crate::overlay::collection::OverlayCollection;
pub use crate::overlay::model::{Direction, Overlay, OverlayId, StyleRef};
pub use crate::render::composite::FrameRGBA;
pub use crate::render::coordinator::{CoordinatorEvent, RenderCoordinator};
pub use crate::render::job::{
    FinalFrameDelay, ImageTransformOptions, LoopConfig, LoopMode, RenderConfiguration, RenderJob,
};
pub use crate::render::protocol::{JobId, RenderResult, WorkerMessage, WorkerRequest};
pub use crate::render::worker::WorkerOpts;
pub use crate::session::editor::{EditingSession, SessionOpts};
pub use crate::session::workflow::{Workflow, WorkflowEvent, WorkflowState};
pub use crate::styles::catalog::{StyleCatalog, StyleMetrics, StyleVariant, SvgCatalog, SvgStyle};
