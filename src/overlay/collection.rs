use std::collections::HashMap;

use crate::{
    foundation::core::{FlipAxis, Point, Size, Vec2},
    overlay::model::{Direction, Overlay, OverlayId, StyleRef, is_valid_size},
};

/// Ordered, id-addressed set of overlays.
///
/// Overlays live in an arena keyed by [`OverlayId`]; `order` holds the stacking order (first is
/// drawn first, i.e. bottom-most). Every mutator is a silent no-op on an unknown id and returns
/// whether it changed anything. Successful mutations bump [`revision`](Self::revision).
#[derive(Clone, Debug, Default)]
pub struct OverlayCollection {
    arena: HashMap<OverlayId, Overlay>,
    order: Vec<OverlayId>,
    revision: u64,
}

impl OverlayCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection holding `overlays` in the given order. Duplicate ids keep the first occurrence
    /// and at most the first selected overlay stays selected.
    pub fn from_overlays(overlays: impl IntoIterator<Item = Overlay>) -> Self {
        let mut out = Self::new();
        let mut seen_selected = false;
        for mut overlay in overlays {
            if out.arena.contains_key(&overlay.id()) {
                continue;
            }
            if overlay.is_selected {
                overlay.is_selected = !seen_selected;
                seen_selected = true;
            }
            out.order.push(overlay.id());
            out.arena.insert(overlay.id(), overlay);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.arena.get(&id)
    }

    pub fn contains(&self, id: OverlayId) -> bool {
        self.arena.contains_key(&id)
    }

    /// Ids in stacking order.
    pub fn ids(&self) -> &[OverlayId] {
        &self.order
    }

    /// Overlays in stacking order.
    pub fn iter(&self) -> impl Iterator<Item = &Overlay> + '_ {
        self.order.iter().filter_map(|id| self.arena.get(id))
    }

    pub fn selected(&self) -> Option<&Overlay> {
        self.iter().find(|o| o.is_selected)
    }

    /// Owned copy of the overlays in stacking order.
    pub fn snapshot(&self) -> Vec<Overlay> {
        self.iter().cloned().collect()
    }

    /// Append `overlay` on top of the stack. It always enters unselected.
    ///
    /// Returns `None` if an overlay with the same id is already present.
    pub fn add(&mut self, mut overlay: Overlay) -> Option<OverlayId> {
        let id = overlay.id();
        if self.arena.contains_key(&id) {
            tracing::debug!(?id, "add ignored: duplicate overlay id");
            return None;
        }
        overlay.is_selected = false;
        self.arena.insert(id, overlay);
        self.order.push(id);
        self.touch();
        Some(id)
    }

    pub fn remove(&mut self, id: OverlayId) -> Option<Overlay> {
        let removed = self.arena.remove(&id)?;
        self.order.retain(|o| *o != id);
        self.touch();
        Some(removed)
    }

    /// Drop every overlay.
    pub fn clear(&mut self) {
        if self.order.is_empty() {
            return;
        }
        self.arena.clear();
        self.order.clear();
        self.touch();
    }

    /// Swap in a new set of overlays. The revision keeps counting up from its current value.
    pub fn replace_all(&mut self, overlays: impl IntoIterator<Item = Overlay>) {
        let revision = self.revision;
        *self = Self::from_overlays(overlays);
        self.revision = revision;
        self.touch();
    }

    /// Translate by `delta` (drag end).
    pub fn move_by(&mut self, id: OverlayId, delta: Vec2) -> bool {
        if !delta.x.is_finite() || !delta.y.is_finite() {
            return false;
        }
        self.update(id, |o| o.position += delta)
    }

    /// Absolute placement of the top-left corner.
    pub fn place_at(&mut self, id: OverlayId, position: Point) -> bool {
        if !position.x.is_finite() || !position.y.is_finite() {
            return false;
        }
        self.update(id, |o| o.position = position)
    }

    /// Resize. Non-positive or non-finite sizes are rejected and the stored size is kept.
    pub fn set_size(&mut self, id: OverlayId, size: Size) -> bool {
        if !is_valid_size(size) {
            tracing::debug!(?id, ?size, "set_size rejected: size must be positive");
            return false;
        }
        self.update(id, |o| o.size = size)
    }

    pub fn set_style(&mut self, id: OverlayId, style: StyleRef) -> bool {
        self.update(id, |o| o.style = style)
    }

    pub fn set_direction(&mut self, id: OverlayId, direction: Direction) -> bool {
        self.update(id, |o| o.direction = direction)
    }

    pub fn toggle_flip(&mut self, id: OverlayId, axis: FlipAxis) -> bool {
        self.update(id, |o| o.toggle_flip(axis))
    }

    /// Exclusive selection toggle: clears every selection, then selects `id` unless it was the
    /// one previously selected.
    pub fn select(&mut self, id: OverlayId) -> bool {
        if !self.arena.contains_key(&id) {
            return false;
        }
        let mut previously_selected = None;
        for overlay in self.arena.values_mut() {
            if overlay.is_selected {
                previously_selected = Some(overlay.id());
            }
            overlay.is_selected = false;
        }
        if previously_selected != Some(id)
            && let Some(overlay) = self.arena.get_mut(&id)
        {
            overlay.is_selected = true;
        }
        self.touch();
        true
    }

    /// Move `old_id` to the slot currently held by `new_id`, shifting the overlays in between.
    pub fn reorder(&mut self, old_id: OverlayId, new_id: OverlayId) -> bool {
        let from = self.order.iter().position(|id| *id == old_id);
        let to = self.order.iter().position(|id| *id == new_id);
        let (Some(from), Some(to)) = (from, to) else {
            return false;
        };
        if from == to {
            return false;
        }
        let moved = self.order.remove(from);
        self.order.insert(to, moved);
        self.touch();
        true
    }

    fn update(&mut self, id: OverlayId, f: impl FnOnce(&mut Overlay)) -> bool {
        let Some(overlay) = self.arena.get_mut(&id) else {
            tracing::debug!(?id, "edit ignored: unknown overlay id");
            return false;
        };
        f(overlay);
        self.touch();
        true
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/collection.rs"]
mod tests;
