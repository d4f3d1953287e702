use crate::foundation::error::{DwiError, DwiResult};

pub use kurbo::{Point, Size, Vec2};

/// Axis selector for mirror operations on overlays and on the whole image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FlipAxis {
    /// Mirror left/right.
    Horizontal,
    /// Mirror top/bottom.
    Vertical,
}

/// Size at which the source image is displayed to the user.
///
/// Overlay positions and sizes live in this space; the worker maps them back onto source pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMetrics {
    pub rendered_width: f64,
    pub rendered_height: f64,
}

impl DisplayMetrics {
    pub fn new(rendered_width: f64, rendered_height: f64) -> DwiResult<Self> {
        let m = Self {
            rendered_width,
            rendered_height,
        };
        m.validate()?;
        Ok(m)
    }

    /// Metrics for an image displayed at its natural size.
    pub fn natural(width: u32, height: u32) -> Self {
        Self {
            rendered_width: f64::from(width),
            rendered_height: f64::from(height),
        }
    }

    pub fn validate(&self) -> DwiResult<()> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(self.rendered_width) || !ok(self.rendered_height) {
            return Err(DwiError::validation(
                "rendered width/height must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// Rendered-vs-natural scale factors (`rendered / natural`) per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayScale {
    pub x: f64,
    pub y: f64,
}

impl DisplayScale {
    pub const IDENTITY: Self = Self { x: 1.0, y: 1.0 };

    pub fn new(metrics: DisplayMetrics, natural_width: u32, natural_height: u32) -> DwiResult<Self> {
        metrics.validate()?;
        if natural_width == 0 || natural_height == 0 {
            return Err(DwiError::validation("natural width/height must be > 0"));
        }
        Ok(Self {
            x: metrics.rendered_width / f64::from(natural_width),
            y: metrics.rendered_height / f64::from(natural_height),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
