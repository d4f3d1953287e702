use crate::foundation::{
    core::Point,
    error::{DwiError, DwiResult},
};

/// Index of the first eye keypoint in detector order.
pub const FIRST_EYE: usize = 0;
/// Index of the second eye keypoint in detector order.
pub const SECOND_EYE: usize = 1;
/// Index of the nose-tip keypoint in detector order.
pub const NOSE_TIP: usize = 2;

/// One detected face: keypoints in detector-space coordinates, in detector order.
///
/// Only the two eyes and the nose tip are used; any further keypoints are ignored.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DetectedFace {
    pub keypoints: Vec<Point>,
}

impl DetectedFace {
    pub fn new(keypoints: Vec<Point>) -> Self {
        Self { keypoints }
    }

    pub fn landmarks(&self) -> DwiResult<FaceLandmarks> {
        let get = |i: usize| {
            self.keypoints
                .get(i)
                .copied()
                .filter(|p| p.x.is_finite() && p.y.is_finite())
        };
        match (get(FIRST_EYE), get(SECOND_EYE), get(NOSE_TIP)) {
            (Some(first_eye), Some(second_eye), Some(nose)) => Ok(FaceLandmarks {
                first_eye,
                second_eye,
                nose,
            }),
            _ => Err(DwiError::detection(format!(
                "face needs finite eye, eye and nose keypoints, got {} keypoint(s)",
                self.keypoints.len()
            ))),
        }
    }
}

/// The three keypoints the placement algorithm relies on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceLandmarks {
    pub first_eye: Point,
    pub second_eye: Point,
    pub nose: Point,
}
