use super::*;
use crate::{assets::raster::PreparedImage, styles::catalog::StyleVariant};
use kurbo::Vec2;

struct FakeCatalog {
    styles: Vec<(StyleRef, StyleMetrics)>,
}

impl FakeCatalog {
    fn single() -> Self {
        Self {
            styles: vec![(StyleRef::new("a"), metrics(600.0, 120.0, 280.0))],
        }
    }

    fn three() -> Self {
        Self {
            styles: vec![
                (StyleRef::new("a"), metrics(600.0, 120.0, 280.0)),
                (StyleRef::new("b"), metrics(600.0, 200.0, 300.0)),
                (StyleRef::new("c"), metrics(600.0, 140.0, 260.0)),
            ],
        }
    }
}

fn metrics(w: f64, h: f64, eyes: f64) -> StyleMetrics {
    StyleMetrics {
        reference_size: Size::new(w, h),
        reference_eyes_distance: eyes,
        reference_anchor_offset: Vec2::new(w / 2.0, h / 2.0),
    }
}

impl StyleCatalog for FakeCatalog {
    fn default_style(&self) -> StyleRef {
        self.styles[0].0.clone()
    }

    fn styles(&self) -> Vec<StyleRef> {
        self.styles.iter().map(|(s, _)| s.clone()).collect()
    }

    fn metrics(&self, style: &StyleRef) -> Option<StyleMetrics> {
        self.styles
            .iter()
            .find(|(s, _)| s == style)
            .map(|(_, m)| *m)
    }

    fn rasterize(&self, _: &StyleRef, _: u32, _: u32, _: StyleVariant) -> DwiResult<PreparedImage> {
        Err(DwiError::render("not needed in placement tests"))
    }
}

struct NeverPick;
impl StylePicker for NeverPick {
    fn pick(&mut self, _pool: &[StyleRef]) -> StyleRef {
        panic!("single-face placement must not consult the picker");
    }
}

struct RecordingPicker {
    pools: Vec<Vec<StyleRef>>,
}
impl StylePicker for RecordingPicker {
    fn pick(&mut self, pool: &[StyleRef]) -> StyleRef {
        self.pools.push(pool.to_vec());
        pool[pool.len() - 1].clone()
    }
}

fn face(eye_a: (f64, f64), eye_b: (f64, f64), nose: (f64, f64)) -> DetectedFace {
    DetectedFace::new(vec![
        Point::new(eye_a.0, eye_a.1),
        Point::new(eye_b.0, eye_b.1),
        Point::new(nose.0, nose.1),
        Point::new(0.0, 0.0),
    ])
}

#[test]
fn single_face_uses_default_style_and_exact_geometry() {
    let catalog = FakeCatalog::three();
    let faces = [face((100.0, 100.0), (128.0, 100.0), (114.0, 120.0))];
    let out = resolve_overlays(&faces, DisplayScale::IDENTITY, &catalog, &mut NeverPick).unwrap();

    assert_eq!(out.len(), 1);
    let o = &out[0];
    assert_eq!(o.style, StyleRef::new("a"));
    // eyes 28 apart vs reference 280 => scale 0.1
    assert!((o.size().width - 60.0).abs() < 1e-9);
    assert!((o.size().height - 12.0).abs() < 1e-9);
    assert!((o.position.x - 84.0).abs() < 1e-9);
    assert!((o.position.y - 94.0).abs() < 1e-9);
}

#[test]
fn display_scale_shrinks_placement() {
    let catalog = FakeCatalog::single();
    let faces = [face((100.0, 100.0), (128.0, 100.0), (114.0, 120.0))];
    let scale = DisplayScale { x: 0.5, y: 0.5 };
    let out = resolve_overlays(&faces, scale, &catalog, &mut NeverPick).unwrap();
    assert!((out[0].size().width - 30.0).abs() < 1e-9);
    assert!((out[0].position.x - 42.0).abs() < 1e-9);
    assert!((out[0].position.y - 47.0).abs() < 1e-9);
}

#[test]
fn tilted_eyes_offset_anchor_by_half_the_vertical_gap() {
    let catalog = FakeCatalog::single();
    let faces = [face((0.0, 100.0), (21.0, 128.0), (10.0, 130.0))];
    let out = resolve_overlays(&faces, DisplayScale::IDENTITY, &catalog, &mut NeverPick).unwrap();
    // distance 35 => scale 0.125 => size 75x15, anchor (37.5, 7.5)
    assert!((out[0].size().width - 75.0).abs() < 1e-9);
    assert!((out[0].position.x - 27.5).abs() < 1e-9);
    assert!((out[0].position.y - (114.0 - 7.5)).abs() < 1e-9);
}

#[test]
fn anchor_past_the_edge_is_reflected_non_negative() {
    let catalog = FakeCatalog::single();
    let faces = [face((0.0, 0.0), (28.0, 0.0), (10.0, 5.0))];
    let out = resolve_overlays(&faces, DisplayScale::IDENTITY, &catalog, &mut NeverPick).unwrap();
    assert!(out[0].position.x >= 0.0);
    assert!(out[0].position.y >= 0.0);
    assert!((out[0].position.x - 20.0).abs() < 1e-9);
}

#[test]
fn width_is_linear_in_eye_distance() {
    let catalog = FakeCatalog::single();
    let faces = [
        face((0.0, 0.0), (80.0, 0.0), (40.0, 20.0)),
        face((200.0, 0.0), (240.0, 0.0), (220.0, 20.0)),
    ];
    let mut picker = SeededStylePicker::new(1);
    let out = resolve_overlays(&faces, DisplayScale::IDENTITY, &catalog, &mut picker).unwrap();
    assert_eq!(out.len(), 2);
    let ratio = out[0].size().width / out[1].size().width;
    assert!((ratio - 2.0).abs() < 1e-9);
}

#[test]
fn later_faces_draw_from_the_whole_catalog() {
    let catalog = FakeCatalog::three();
    let faces = [
        face((0.0, 0.0), (28.0, 0.0), (14.0, 10.0)),
        face((50.0, 0.0), (78.0, 0.0), (64.0, 10.0)),
        face((100.0, 0.0), (128.0, 0.0), (114.0, 10.0)),
    ];
    let mut picker = RecordingPicker { pools: Vec::new() };
    let out = resolve_overlays(&faces, DisplayScale::IDENTITY, &catalog, &mut picker).unwrap();

    assert_eq!(out[0].style, StyleRef::new("a"));
    assert_eq!(picker.pools.len(), 2);
    for pool in &picker.pools {
        assert_eq!(
            pool,
            &vec![StyleRef::new("a"), StyleRef::new("b"), StyleRef::new("c")]
        );
    }
    assert_eq!(out[1].style, StyleRef::new("c"));
}

#[test]
fn seeded_picker_is_reproducible() {
    let pool = [StyleRef::new("x"), StyleRef::new("y"), StyleRef::new("z")];
    let mut a = SeededStylePicker::new(99);
    let mut b = SeededStylePicker::new(99);
    for _ in 0..20 {
        assert_eq!(a.pick(&pool), b.pick(&pool));
    }
}

#[test]
fn zero_faces_yield_one_default_overlay() {
    let catalog = FakeCatalog::three();
    let out = resolve_overlays(&[], DisplayScale::IDENTITY, &catalog, &mut NeverPick).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].position, DEFAULT_OVERLAY_POSITION);
    assert_eq!(out[0].size(), Size::new(DEFAULT_OVERLAY_WIDTH, 20.0));
    assert_eq!(out[0].style, catalog.default_style());
}

#[test]
fn faces_missing_keypoints_are_detection_errors() {
    let catalog = FakeCatalog::single();
    let faces = [DetectedFace::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)])];
    let err = resolve_overlays(&faces, DisplayScale::IDENTITY, &catalog, &mut NeverPick)
        .unwrap_err();
    assert!(matches!(err, DwiError::Detection(_)));
}

#[test]
fn coincident_eyes_fall_back_to_default() {
    let catalog = FakeCatalog::single();
    let faces = [face((10.0, 10.0), (10.0, 10.0), (10.0, 20.0))];
    let out = resolve_overlays(&faces, DisplayScale::IDENTITY, &catalog, &mut NeverPick).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].position, DEFAULT_OVERLAY_POSITION);
}

#[test]
fn every_overlay_gets_a_distinct_id() {
    let catalog = FakeCatalog::three();
    let faces = [
        face((0.0, 0.0), (28.0, 0.0), (14.0, 10.0)),
        face((50.0, 0.0), (78.0, 0.0), (64.0, 10.0)),
    ];
    let mut picker = SeededStylePicker::new(3);
    let out = resolve_overlays(&faces, DisplayScale::IDENTITY, &catalog, &mut picker).unwrap();
    assert_ne!(out[0].id(), out[1].id());
}
