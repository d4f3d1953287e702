use crate::{
    animation::ease::Ease,
    foundation::core::{Point, Size},
    overlay::model::Direction,
};

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Point {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Point::new(
            <f64 as Lerp>::lerp(&a.x, &b.x, t),
            <f64 as Lerp>::lerp(&a.y, &b.y, t),
        )
    }
}

impl Lerp for Size {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Size::new(
            <f64 as Lerp>::lerp(&a.width, &b.width, t),
            <f64 as Lerp>::lerp(&a.height, &b.height, t),
        )
    }
}

/// Placement of an overlay in one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Point,
    pub size: Size,
}

impl Lerp for Pose {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            position: <Point as Lerp>::lerp(&a.position, &b.position, t),
            size: <Size as Lerp>::lerp(&a.size, &b.size, t),
        }
    }
}

/// `t(i) = i / (frame_count - 1)`, clamped to `[0, 1]`. A single frame is already at rest.
pub fn arrival_progress(frame: u32, frame_count: u32) -> f64 {
    if frame_count < 2 {
        return 1.0;
    }
    (f64::from(frame) / f64::from(frame_count - 1)).clamp(0.0, 1.0)
}

/// Pose just outside `canvas` on the `direction` edge, same size as `rest`.
pub fn start_pose(rest: Pose, direction: Direction, canvas: Size) -> Pose {
    let Pose { position, size } = rest;
    let position = match direction {
        Direction::Up => Point::new(position.x, -size.height),
        Direction::Down => Point::new(position.x, canvas.height),
        Direction::Left => Point::new(-size.width, position.y),
        Direction::Right => Point::new(canvas.width, position.y),
    };
    Pose { position, size }
}

/// Pose at progress `t`; monotonic in `t` and exactly `rest` at `t = 1`.
pub fn pose_at(rest: Pose, direction: Direction, canvas: Size, t: f64, ease: Ease) -> Pose {
    let te = ease.apply(t);
    if te >= 1.0 {
        return rest;
    }
    <Pose as Lerp>::lerp(&start_pose(rest, direction, canvas), &rest, te)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/arrival.rs"]
mod tests;
