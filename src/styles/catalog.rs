use std::sync::Arc;

use anyhow::Context;

use crate::{
    assets::raster::PreparedImage,
    foundation::core::{Size, Vec2},
    foundation::error::{DwiError, DwiResult},
    overlay::model::{Direction, StyleRef},
};

/// Reference geometry of a style, in the style's own unscaled pixel space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleMetrics {
    pub reference_size: Size,
    /// Distance between the two lens centers.
    pub reference_eyes_distance: f64,
    /// Point of the style that sits on the eye line between the eyes.
    pub reference_anchor_offset: Vec2,
}

impl StyleMetrics {
    pub fn validate(&self) -> DwiResult<()> {
        let pos = |v: f64| v.is_finite() && v > 0.0;
        if !pos(self.reference_size.width) || !pos(self.reference_size.height) {
            return Err(DwiError::validation("style reference size must be > 0"));
        }
        if !pos(self.reference_eyes_distance) {
            return Err(DwiError::validation(
                "style reference eyes distance must be > 0",
            ));
        }
        if !self.reference_anchor_offset.x.is_finite() || !self.reference_anchor_offset.y.is_finite()
        {
            return Err(DwiError::validation("style anchor offset must be finite"));
        }
        Ok(())
    }

    /// Height for `width` keeping the reference aspect ratio.
    pub fn height_for_width(&self, width: f64) -> f64 {
        width * self.reference_size.height / self.reference_size.width
    }
}

/// Fixed transforms baked into a rasterized style.
///
/// Mirrors apply in the style's own axes, then `direction` rotates the result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StyleVariant {
    pub horizontal: bool,
    pub vertical: bool,
    pub direction: Direction,
}

/// Source of overlay styles: reference geometry plus renderable pixels.
///
/// Shared between the interactive side (placement) and the rendering worker (pixels), hence
/// `Send + Sync`.
pub trait StyleCatalog: Send + Sync {
    /// Style applied to single faces, zero-face fallbacks and user "add".
    fn default_style(&self) -> StyleRef;

    /// Every style reference, default first.
    fn styles(&self) -> Vec<StyleRef>;

    fn metrics(&self, style: &StyleRef) -> Option<StyleMetrics>;

    /// Rasterize `style` to exactly `width x height` premultiplied RGBA8 with `variant` applied.
    ///
    /// `width x height` is the final box; for a sideways direction the style itself is drawn
    /// `height` wide and `width` tall before the rotation.
    fn rasterize(
        &self,
        style: &StyleRef,
        width: u32,
        height: u32,
        variant: StyleVariant,
    ) -> DwiResult<PreparedImage>;

    fn contains(&self, style: &StyleRef) -> bool {
        self.metrics(style).is_some()
    }
}

/// Vector style definition: SVG source plus its reference geometry.
#[derive(Clone, Debug)]
pub struct SvgStyle {
    pub name: String,
    pub svg: String,
    pub metrics: StyleMetrics,
}

struct ParsedStyle {
    style: StyleRef,
    tree: Arc<usvg::Tree>,
    metrics: StyleMetrics,
}

/// Catalog of SVG styles rasterized with `resvg`.
pub struct SvgCatalog {
    styles: Vec<ParsedStyle>,
}

impl std::fmt::Debug for SvgCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgCatalog")
            .field(
                "styles",
                &self.styles.iter().map(|s| s.style.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl SvgCatalog {
    /// Catalog of the built-in sunglasses styles; `classic` is the default.
    pub fn builtin() -> DwiResult<Self> {
        Self::from_styles(builtin_styles())
    }

    /// Catalog from custom styles; the first entry becomes the default.
    pub fn from_styles(styles: Vec<SvgStyle>) -> DwiResult<Self> {
        if styles.is_empty() {
            return Err(DwiError::validation("style catalog must not be empty"));
        }
        let mut parsed: Vec<ParsedStyle> = Vec::with_capacity(styles.len());
        for s in styles {
            if parsed.iter().any(|p| p.style.as_str() == s.name) {
                return Err(DwiError::validation(format!(
                    "duplicate style name '{}'",
                    s.name
                )));
            }
            s.metrics.validate()?;
            let tree = usvg::Tree::from_str(&s.svg, &usvg::Options::default())
                .with_context(|| format!("parse svg for style '{}'", s.name))?;
            parsed.push(ParsedStyle {
                style: StyleRef::new(s.name),
                tree: Arc::new(tree),
                metrics: s.metrics,
            });
        }
        Ok(Self { styles: parsed })
    }

    fn find(&self, style: &StyleRef) -> Option<&ParsedStyle> {
        self.styles.iter().find(|p| &p.style == style)
    }
}

impl StyleCatalog for SvgCatalog {
    fn default_style(&self) -> StyleRef {
        self.styles[0].style.clone()
    }

    fn styles(&self) -> Vec<StyleRef> {
        self.styles.iter().map(|p| p.style.clone()).collect()
    }

    fn metrics(&self, style: &StyleRef) -> Option<StyleMetrics> {
        self.find(style).map(|p| p.metrics)
    }

    fn rasterize(
        &self,
        style: &StyleRef,
        width: u32,
        height: u32,
        variant: StyleVariant,
    ) -> DwiResult<PreparedImage> {
        let parsed = self
            .find(style)
            .ok_or_else(|| DwiError::validation(format!("unknown style '{style}'")))?;
        const MAX_DIM: u32 = 16_384;
        if width == 0 || height == 0 || width > MAX_DIM || height > MAX_DIM {
            return Err(DwiError::render(format!(
                "style raster size out of range: {width}x{height}"
            )));
        }

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| DwiError::render("failed to allocate style pixmap"))?;
        let tree_size = parsed.tree.size();
        let xform = variant_transform(
            variant,
            (width as f32, height as f32),
            (tree_size.width(), tree_size.height()),
        );
        resvg::render(&parsed.tree, xform, &mut pixmap.as_mut());

        PreparedImage::new(width, height, pixmap.take())
            .ok_or_else(|| DwiError::render("style pixmap has unexpected length"))
    }
}

/// SVG-to-pixmap transform: scale into the unrotated box, mirror, then rotate clockwise by
/// the direction's quarter turns so the result fills `box_size`.
fn variant_transform(
    variant: StyleVariant,
    box_size: (f32, f32),
    svg_size: (f32, f32),
) -> resvg::tiny_skia::Transform {
    let (bw, bh) = box_size;
    let (lw, lh) = if variant.direction.is_sideways() {
        (bh, bw)
    } else {
        (bw, bh)
    };
    let fx = (if variant.horizontal { -lw } else { lw }) / svg_size.0;
    let fy = (if variant.vertical { -lh } else { lh }) / svg_size.1;
    let ox = if variant.horizontal { lw } else { 0.0 };
    let oy = if variant.vertical { lh } else { 0.0 };

    // Local point (fx*x + ox, fy*y + oy) rotated inside the box.
    let (sx, ky, kx, sy, tx, ty) = match variant.direction.quarter_turns() {
        1 => (0.0, fx, -fy, 0.0, lh - oy, ox),
        2 => (-fx, 0.0, 0.0, -fy, lw - ox, lh - oy),
        3 => (0.0, -fx, fy, 0.0, oy, lw - ox),
        _ => (fx, 0.0, 0.0, fy, ox, oy),
    };
    resvg::tiny_skia::Transform::from_row(sx, ky, kx, sy, tx, ty)
}

const CLASSIC_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="60" height="12" viewBox="0 0 60 12" shape-rendering="crispEdges">
<path fill="#000" d="M0 0h60v2H0z M28 2h4v2h-4z M4 2h24v6h-2v2h-4v2h-12v-2h-4v-2h-2z M32 2h24v6h-2v2h-4v2h-12v-2h-4v-2h-2z"/>
<path fill="#fff" d="M8 3h2v2H8z M10 5h2v2h-2z M36 3h2v2h-2z M38 5h2v2h-2z"/>
</svg>"##;

const ROUND_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="60" height="20" viewBox="0 0 60 20">
<path fill="none" stroke="#000" stroke-width="2" d="M23 8q7-4 14 0"/>
<path fill="none" stroke="#000" stroke-width="1.5" d="M7 9L1 6M53 9l6-3"/>
<circle cx="15" cy="11" r="8" fill="#000"/>
<circle cx="45" cy="11" r="8" fill="#000"/>
<circle cx="12" cy="8" r="2" fill="#fff"/>
<circle cx="42" cy="8" r="2" fill="#fff"/>
</svg>"##;

const VISOR_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="60" height="14" viewBox="0 0 60 14">
<rect x="2" y="2" width="56" height="10" rx="4" fill="#000"/>
<rect x="6" y="4" width="48" height="2" rx="1" fill="#fff" fill-opacity="0.6"/>
</svg>"##;

fn builtin_styles() -> Vec<SvgStyle> {
    // Reference space is the SVG viewBox scaled 10x.
    vec![
        SvgStyle {
            name: "classic".to_string(),
            svg: CLASSIC_SVG.to_string(),
            metrics: StyleMetrics {
                reference_size: Size::new(600.0, 120.0),
                reference_eyes_distance: 280.0,
                reference_anchor_offset: Vec2::new(300.0, 60.0),
            },
        },
        SvgStyle {
            name: "round".to_string(),
            svg: ROUND_SVG.to_string(),
            metrics: StyleMetrics {
                reference_size: Size::new(600.0, 200.0),
                reference_eyes_distance: 300.0,
                reference_anchor_offset: Vec2::new(300.0, 110.0),
            },
        },
        SvgStyle {
            name: "visor".to_string(),
            svg: VISOR_SVG.to_string(),
            metrics: StyleMetrics {
                reference_size: Size::new(600.0, 140.0),
                reference_eyes_distance: 260.0,
                reference_anchor_offset: Vec2::new(300.0, 70.0),
            },
        },
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/styles/catalog.rs"]
mod tests;
