use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::{FlipAxis, Point, Size};

static NEXT_OVERLAY_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique overlay identity. Never reused, never positional.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct OverlayId(u64);

impl OverlayId {
    pub(crate) fn next() -> Self {
        Self(NEXT_OVERLAY_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Reference into a [`StyleCatalog`](crate::StyleCatalog).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StyleRef(String);

impl StyleRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StyleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Facing of an overlay: where the top edge of the style points.
///
/// `Up` draws the style as authored; the others rotate it clockwise by a quarter, half or
/// three-quarter turn. The rotation is fixed for the whole animation, and the overlay slides in
/// from the image edge its top points to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Clockwise quarter turns from the authored orientation.
    pub fn quarter_turns(self) -> u8 {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }

    /// Whether the rotation swaps width and height.
    pub fn is_sideways(self) -> bool {
        self.quarter_turns() % 2 == 1
    }
}

/// One placed accessory instance.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    id: OverlayId,
    /// Top-left corner in displayed-image space.
    pub position: Point,
    /// Render size in displayed-image space; both components stay > 0.
    pub(crate) size: Size,
    pub style: StyleRef,
    pub direction: Direction,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub(crate) is_selected: bool,
}

impl Overlay {
    /// Fresh overlay with a newly allocated id. Returns `None` for a non-positive size.
    pub fn new(style: StyleRef, position: Point, size: Size) -> Option<Self> {
        if !is_valid_size(size) {
            return None;
        }
        Some(Self {
            id: OverlayId::next(),
            position,
            size,
            style,
            direction: Direction::default(),
            flip_horizontal: false,
            flip_vertical: false,
            is_selected: false,
        })
    }

    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    pub fn flipped(&self, axis: FlipAxis) -> bool {
        match axis {
            FlipAxis::Horizontal => self.flip_horizontal,
            FlipAxis::Vertical => self.flip_vertical,
        }
    }

    pub(crate) fn toggle_flip(&mut self, axis: FlipAxis) {
        match axis {
            FlipAxis::Horizontal => self.flip_horizontal = !self.flip_horizontal,
            FlipAxis::Vertical => self.flip_vertical = !self.flip_vertical,
        }
    }
}

pub(crate) fn is_valid_size(size: Size) -> bool {
    size.width.is_finite() && size.height.is_finite() && size.width > 0.0 && size.height > 0.0
}
