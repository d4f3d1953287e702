use super::*;
use crate::foundation::{core::Point, error::DwiError};

fn image() -> PreparedImage {
    PreparedImage::new(1, 1, vec![0, 0, 0, 255]).unwrap()
}

#[test]
fn parses_face_keypoint_lists() {
    let mut d = StaticDetector::from_json(
        r#"[[{"x":1,"y":2},{"x":3,"y":4},{"x":2,"y":6}],[{"x":10,"y":10}]]"#,
    )
    .unwrap();
    let faces = d.detect(&image()).unwrap();
    assert_eq!(faces.len(), 2);
    assert_eq!(faces[0].keypoints[2], Point::new(2.0, 6.0));
    assert_eq!(faces[1].keypoints.len(), 1);
}

#[test]
fn empty_list_means_no_faces() {
    let mut d = StaticDetector::from_json("[]").unwrap();
    assert!(d.detect(&image()).unwrap().is_empty());
}

#[test]
fn malformed_json_is_an_error() {
    let err = StaticDetector::from_json(r#"{"faces": 1}"#).unwrap_err();
    assert!(matches!(err, DwiError::Other(_)));
}
