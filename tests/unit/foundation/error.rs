use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(DwiError::input("x").to_string().contains("input error:"));
    assert!(
        DwiError::detection("x")
            .to_string()
            .contains("detection error:")
    );
    assert!(
        DwiError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(DwiError::render("x").to_string().contains("render error:"));
}

#[test]
fn transition_names_state_and_event() {
    let err = DwiError::Transition {
        from: WorkflowState::Start,
        event: WorkflowEvent::RenderCompleted,
    };
    let msg = err.to_string();
    assert!(msg.contains("Start"));
    assert!(msg.contains("RenderCompleted"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = DwiError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
