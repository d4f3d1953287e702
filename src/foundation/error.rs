use crate::session::workflow::{WorkflowEvent, WorkflowState};

/// Crate-wide result alias.
pub type DwiResult<T> = Result<T, DwiError>;

/// Error taxonomy shared by every stage of the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum DwiError {
    /// Unsupported or corrupt source image.
    #[error("input error: {0}")]
    Input(String),

    /// Face-detection capability failed (zero faces is not an error).
    #[error("detection error: {0}")]
    Detection(String),

    /// Configuration or job failed its bounds check.
    #[error("validation error: {0}")]
    Validation(String),

    /// Compositing or encoding failed inside the rendering worker.
    #[error("render error: {0}")]
    Render(String),

    /// Event is not accepted from the current workflow state.
    #[error("invalid transition: {event:?} from {from:?}")]
    Transition {
        /// State the machine was in.
        from: WorkflowState,
        /// Rejected event.
        event: WorkflowEvent,
    },

    /// Contextualized IO / codec failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DwiError {
    /// Build an [`DwiError::Input`].
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build an [`DwiError::Detection`].
    pub fn detection(msg: impl Into<String>) -> Self {
        Self::Detection(msg.into())
    }

    /// Build an [`DwiError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`DwiError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
