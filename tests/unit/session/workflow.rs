use super::*;

use WorkflowEvent as E;
use WorkflowState as S;

fn drive(events: &[WorkflowEvent]) -> Workflow {
    let mut w = Workflow::new();
    for e in events {
        w.apply(*e).unwrap();
    }
    w
}

#[test]
fn happy_path_reaches_done_and_back() {
    let mut w = drive(&[E::ImageSupplied, E::ImageDecoded, E::FacesDetected]);
    assert_eq!(w.state(), S::Ready);
    assert!(w.can_edit());
    assert_eq!(w.apply(E::RenderDispatched).unwrap(), S::Generating);
    assert!(!w.can_edit());
    assert_eq!(w.apply(E::RenderCompleted).unwrap(), S::Done);
    assert_eq!(w.apply(E::ResultDismissed).unwrap(), S::Ready);
}

#[test]
fn failures_return_to_the_right_state() {
    assert_eq!(drive(&[E::ImageSupplied, E::ImageRejected]).state(), S::Start);
    assert_eq!(
        drive(&[E::ImageSupplied, E::ImageDecoded, E::DetectionFailed]).state(),
        S::Start
    );
    let ready = [E::ImageSupplied, E::ImageDecoded, E::FacesDetected, E::RenderDispatched];
    let mut w = drive(&ready);
    assert_eq!(w.apply(E::RenderFailed).unwrap(), S::Ready);
    let mut w2 = drive(&ready);
    assert_eq!(w2.apply(E::RenderCancelled).unwrap(), S::Ready);
}

#[test]
fn reset_is_accepted_everywhere() {
    let paths: [&[WorkflowEvent]; 4] = [
        &[],
        &[E::ImageSupplied],
        &[E::ImageSupplied, E::ImageDecoded, E::FacesDetected],
        &[E::ImageSupplied, E::ImageDecoded, E::FacesDetected, E::RenderDispatched],
    ];
    for path in paths {
        let mut w = drive(path);
        assert_eq!(w.apply(E::Reset).unwrap(), S::Start);
    }
}

#[test]
fn rejected_events_leave_state_unchanged() {
    let mut w = Workflow::new();
    let err = w.apply(E::RenderCompleted).unwrap_err();
    assert!(matches!(
        err,
        DwiError::Transition {
            from: S::Start,
            event: E::RenderCompleted
        }
    ));
    assert_eq!(w.state(), S::Start);

    let mut w = drive(&[E::ImageSupplied, E::ImageDecoded, E::FacesDetected]);
    assert!(w.apply(E::RenderCompleted).is_err());
    assert!(w.apply(E::ImageSupplied).is_err());
    assert_eq!(w.state(), S::Ready);
}

#[test]
fn only_ready_allows_edits() {
    for state in [S::Start, S::Loading, S::Detecting, S::Generating, S::Done] {
        assert!(!Workflow { state }.can_edit());
    }
}

#[test]
fn state_serializes_upper_case() {
    assert_eq!(serde_json::to_string(&S::Generating).unwrap(), "\"GENERATING\"");
}
