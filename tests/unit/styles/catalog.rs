use super::*;

fn catalog() -> SvgCatalog {
    SvgCatalog::builtin().unwrap()
}

#[test]
fn builtin_lists_default_first() {
    let c = catalog();
    let styles = c.styles();
    assert_eq!(styles[0], c.default_style());
    assert_eq!(c.default_style().as_str(), "classic");
    assert!(styles.len() >= 3);
    for s in &styles {
        c.metrics(s).unwrap().validate().unwrap();
    }
}

#[test]
fn rasterize_produces_requested_size_with_ink() {
    let c = catalog();
    let img = c
        .rasterize(&c.default_style(), 120, 24, StyleVariant::default())
        .unwrap();
    assert_eq!((img.width, img.height), (120, 24));
    assert_eq!(img.rgba8_premul.len(), 120 * 24 * 4);
    assert!(img.rgba8_premul.chunks_exact(4).any(|p| p[3] == 255));
    assert!(img.rgba8_premul.chunks_exact(4).any(|p| p[3] == 0));
}

#[test]
fn horizontal_flip_mirrors_columns() {
    let c = catalog();
    let style = StyleRef::new("round");
    let plain = c.rasterize(&style, 60, 20, StyleVariant::default()).unwrap();
    let flipped = c
        .rasterize(
            &style,
            60,
            20,
            StyleVariant {
                horizontal: true,
                ..StyleVariant::default()
            },
        )
        .unwrap();
    // Highlights sit up-left inside each lens; after mirroring they sit up-right.
    assert_eq!(plain.pixel(12, 8), flipped.pixel(47, 8));
    assert_ne!(plain.pixel(12, 8), flipped.pixel(12, 8));
}

#[test]
fn unknown_style_is_validation_error() {
    let c = catalog();
    let err = c
        .rasterize(&StyleRef::new("monocle"), 10, 10, StyleVariant::default())
        .unwrap_err();
    assert!(matches!(err, DwiError::Validation(_)));
    assert!(!c.contains(&StyleRef::new("monocle")));
}

#[test]
fn zero_raster_size_is_rejected() {
    let c = catalog();
    assert!(
        c.rasterize(&c.default_style(), 0, 10, StyleVariant::default())
            .is_err()
    );
}

#[test]
fn custom_catalog_rejects_duplicates_and_bad_metrics() {
    let style = |name: &str, eyes: f64| SvgStyle {
        name: name.to_string(),
        svg: r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2"><rect width="4" height="2"/></svg>"#
            .to_string(),
        metrics: StyleMetrics {
            reference_size: Size::new(40.0, 20.0),
            reference_eyes_distance: eyes,
            reference_anchor_offset: Vec2::new(20.0, 10.0),
        },
    };
    assert!(SvgCatalog::from_styles(vec![]).is_err());
    assert!(SvgCatalog::from_styles(vec![style("a", 10.0), style("a", 10.0)]).is_err());
    assert!(SvgCatalog::from_styles(vec![style("a", 0.0)]).is_err());
    let c = SvgCatalog::from_styles(vec![style("a", 10.0), style("b", 10.0)]).unwrap();
    assert_eq!(c.default_style().as_str(), "a");
}

#[test]
fn height_for_width_keeps_aspect() {
    let m = catalog().metrics(&StyleRef::new("classic")).unwrap();
    assert_eq!(m.height_for_width(100.0), 20.0);
}

fn top_bar() -> SvgCatalog {
    SvgCatalog::from_styles(vec![SvgStyle {
        name: "bar".to_string(),
        svg: r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2"><rect width="4" height="1"/></svg>"#
            .to_string(),
        metrics: StyleMetrics {
            reference_size: Size::new(40.0, 20.0),
            reference_eyes_distance: 20.0,
            reference_anchor_offset: Vec2::new(20.0, 10.0),
        },
    }])
    .unwrap()
}

fn alpha(img: &PreparedImage, x: u32, y: u32) -> u8 {
    img.pixel(x, y)[3]
}

#[test]
fn direction_rotates_the_style_clockwise() {
    let c = top_bar();
    let bar = StyleRef::new("bar");
    let facing = |direction: Direction, w: u32, h: u32| {
        c.rasterize(
            &bar,
            w,
            h,
            StyleVariant {
                direction,
                ..StyleVariant::default()
            },
        )
        .unwrap()
    };

    let up = facing(Direction::Up, 40, 20);
    assert_eq!((alpha(&up, 20, 4), alpha(&up, 20, 15)), (255, 0));

    let down = facing(Direction::Down, 40, 20);
    assert_eq!((alpha(&down, 20, 4), alpha(&down, 20, 15)), (0, 255));

    // Sideways boxes are tall; the style's top edge points right or left.
    let right = facing(Direction::Right, 20, 40);
    assert_eq!((alpha(&right, 15, 20), alpha(&right, 4, 20)), (255, 0));

    let left = facing(Direction::Left, 20, 40);
    assert_eq!((alpha(&left, 4, 20), alpha(&left, 15, 20)), (255, 0));
}

#[test]
fn vertical_flip_then_quarter_turn() {
    let c = top_bar();
    let img = c
        .rasterize(
            &StyleRef::new("bar"),
            20,
            40,
            StyleVariant {
                vertical: true,
                direction: Direction::Right,
                ..StyleVariant::default()
            },
        )
        .unwrap();
    // The mirrored bar sits at the bottom, which the turn moves to the left.
    assert_eq!((alpha(&img, 4, 20), alpha(&img, 15, 20)), (255, 0));
}
