use crate::{
    foundation::core::{DisplayScale, Point, Size},
    foundation::error::{DwiError, DwiResult},
    foundation::math::Rng64,
    geometry::keypoints::{DetectedFace, FaceLandmarks},
    overlay::model::{Overlay, StyleRef},
    styles::catalog::{StyleCatalog, StyleMetrics},
};

/// Top-left corner of an overlay that is not derived from a face.
pub const DEFAULT_OVERLAY_POSITION: Point = Point::new(0.0, 0.0);
/// Width of an overlay that is not derived from a face; height follows the style's aspect.
pub const DEFAULT_OVERLAY_WIDTH: f64 = 100.0;

/// Chooses styles for the second and later faces of a multi-face image.
pub trait StylePicker {
    /// Pick one of `pool`. `pool` is never empty.
    fn pick(&mut self, pool: &[StyleRef]) -> StyleRef;
}

/// [`StylePicker`] backed by a seedable [`Rng64`].
#[derive(Clone, Copy, Debug)]
pub struct SeededStylePicker {
    rng: Rng64,
}

impl SeededStylePicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rng64::new(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Rng64::from_entropy(),
        }
    }
}

impl StylePicker for SeededStylePicker {
    fn pick(&mut self, pool: &[StyleRef]) -> StyleRef {
        pool[self.rng.next_index(pool.len())].clone()
    }
}

/// Position and size derived for one face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: Point,
    pub size: Size,
}

/// Overlay at the library default placement, using `style` or the catalog default.
pub fn default_overlay(catalog: &dyn StyleCatalog, style: Option<StyleRef>) -> DwiResult<Overlay> {
    let style = style.unwrap_or_else(|| catalog.default_style());
    let metrics = catalog
        .metrics(&style)
        .ok_or_else(|| DwiError::validation(format!("unknown style '{style}'")))?;
    let size = Size::new(
        DEFAULT_OVERLAY_WIDTH,
        metrics.height_for_width(DEFAULT_OVERLAY_WIDTH),
    );
    Overlay::new(style, DEFAULT_OVERLAY_POSITION, size)
        .ok_or_else(|| DwiError::validation("default overlay size must be > 0"))
}

/// Place a style on one face.
///
/// The style is scaled uniformly by the ratio of the displayed inter-eye distance to the style's
/// reference distance, then shifted so its anchor lands on the nose x / eye-line y. Returns
/// `None` when the eyes coincide.
pub fn place_on_face(
    face: FaceLandmarks,
    scale: DisplayScale,
    metrics: &StyleMetrics,
) -> Option<Placement> {
    let dx = face.first_eye.x - face.second_eye.x;
    let dy = face.first_eye.y - face.second_eye.y;
    let eyes_distance = ((scale.y * dy).powi(2) + (scale.x * dx).powi(2)).sqrt();
    let glasses_scale = eyes_distance / metrics.reference_eyes_distance;
    let size = metrics.reference_size * glasses_scale;
    if !(size.width > 0.0 && size.height > 0.0) || !size.is_finite() {
        return None;
    }

    let scale_x = size.width / metrics.reference_size.width;
    let scale_y = size.height / metrics.reference_size.height;
    let nose_y = dy.abs() / 2.0;
    let anchor = metrics.reference_anchor_offset;
    let position = Point::new(
        (face.nose.x * scale.x - anchor.x * scale_x).abs(),
        ((face.first_eye.y + nose_y) * scale.y - anchor.y * scale_y).abs(),
    );
    Some(Placement { position, size })
}

/// Initial overlays for an image: one per face, or one default overlay for zero faces.
///
/// A lone face gets the default style; with several faces, every face after the first gets a
/// style from `picker` drawn from the whole catalog.
#[tracing::instrument(skip_all, fields(faces = faces.len()))]
pub fn resolve_overlays(
    faces: &[DetectedFace],
    scale: DisplayScale,
    catalog: &dyn StyleCatalog,
    picker: &mut dyn StylePicker,
) -> DwiResult<Vec<Overlay>> {
    if faces.is_empty() {
        return Ok(vec![default_overlay(catalog, None)?]);
    }

    let default_style = catalog.default_style();
    let mut pool = catalog.styles();
    if pool.is_empty() {
        pool.push(default_style.clone());
    }

    let mut out = Vec::with_capacity(faces.len());
    for (i, face) in faces.iter().enumerate() {
        let landmarks = face.landmarks()?;
        let style = if i == 0 {
            default_style.clone()
        } else {
            picker.pick(&pool)
        };
        let metrics = catalog
            .metrics(&style)
            .ok_or_else(|| DwiError::validation(format!("unknown style '{style}'")))?;
        let Some(placement) = place_on_face(landmarks, scale, &metrics) else {
            tracing::warn!(face = i, "skipping face with coincident eye keypoints");
            continue;
        };
        if let Some(overlay) = Overlay::new(style, placement.position, placement.size) {
            out.push(overlay);
        }
    }

    if out.is_empty() {
        out.push(default_overlay(catalog, None)?);
    }
    tracing::debug!(overlays = out.len(), "resolved initial overlays");
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/resolver.rs"]
mod tests;
