pub mod detector;
pub mod keypoints;
pub mod resolver;
