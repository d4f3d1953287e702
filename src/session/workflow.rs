use crate::foundation::error::{DwiError, DwiResult};

/// Where an editing session is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    /// No image.
    #[default]
    Start,
    /// Image supplied, being decoded.
    Loading,
    /// Image decoded, faces being detected.
    Detecting,
    /// Overlays editable, render can be dispatched.
    Ready,
    /// Render job in flight.
    Generating,
    /// Result available.
    Done,
}

/// Inputs that drive [`WorkflowState`] transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkflowEvent {
    ImageSupplied,
    ImageDecoded,
    ImageRejected,
    FacesDetected,
    DetectionFailed,
    ImageRemoved,
    RenderDispatched,
    RenderCompleted,
    RenderFailed,
    RenderCancelled,
    ResultDismissed,
    /// Back to [`WorkflowState::Start`] from anywhere.
    Reset,
}

/// Transition table. `None` means the event is not accepted in `state`.
pub fn next_state(state: WorkflowState, event: WorkflowEvent) -> Option<WorkflowState> {
    use WorkflowEvent as E;
    use WorkflowState as S;

    Some(match (state, event) {
        (_, E::Reset) => S::Start,
        (S::Start, E::ImageSupplied) => S::Loading,
        (S::Loading, E::ImageDecoded) => S::Detecting,
        (S::Loading, E::ImageRejected) => S::Start,
        (S::Detecting, E::FacesDetected) => S::Ready,
        (S::Detecting, E::DetectionFailed) => S::Start,
        (S::Ready, E::ImageRemoved) => S::Start,
        (S::Ready, E::RenderDispatched) => S::Generating,
        (S::Generating, E::RenderCompleted) => S::Done,
        (S::Generating, E::RenderFailed | E::RenderCancelled) => S::Ready,
        (S::Done, E::ResultDismissed) => S::Ready,
        _ => return None,
    })
}

/// Session lifecycle holder. Rejected events leave the state untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Workflow {
    state: WorkflowState,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Overlays and render settings may only change in READY.
    pub fn can_edit(&self) -> bool {
        self.state == WorkflowState::Ready
    }

    pub fn apply(&mut self, event: WorkflowEvent) -> DwiResult<WorkflowState> {
        let from = self.state;
        let to = next_state(from, event).ok_or(DwiError::Transition { from, event })?;
        if from != to {
            tracing::debug!(?from, ?to, ?event, "workflow transition");
        }
        self.state = to;
        Ok(to)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/workflow.rs"]
mod tests;
