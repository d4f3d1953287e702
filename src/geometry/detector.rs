use anyhow::Context;

use crate::{
    assets::raster::PreparedImage, foundation::error::DwiResult, geometry::keypoints::DetectedFace,
};

/// Face-landmark detection capability.
///
/// Returns zero or more faces for a decoded image; zero faces is a valid answer. A returned
/// error is treated like an unusable image.
pub trait FaceDetector: Send {
    fn detect(&mut self, image: &PreparedImage) -> DwiResult<Vec<DetectedFace>>;
}

/// Detector that answers with a fixed, precomputed face list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaticDetector {
    faces: Vec<DetectedFace>,
}

impl StaticDetector {
    pub fn new(faces: Vec<DetectedFace>) -> Self {
        Self { faces }
    }

    /// Parse `[[{"x": .., "y": ..}, ...], ...]`: one keypoint list per face, in detector order.
    pub fn from_json(json: &str) -> DwiResult<Self> {
        let faces: Vec<DetectedFace> =
            serde_json::from_str(json).context("parse face keypoints json")?;
        Ok(Self::new(faces))
    }

    pub fn faces(&self) -> &[DetectedFace] {
        &self.faces
    }
}

impl FaceDetector for StaticDetector {
    fn detect(&mut self, image: &PreparedImage) -> DwiResult<Vec<DetectedFace>> {
        tracing::debug!(
            width = image.width,
            height = image.height,
            faces = self.faces.len(),
            "static detection"
        );
        Ok(self.faces.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/detector.rs"]
mod tests;
