pub mod editor;
pub mod workflow;
