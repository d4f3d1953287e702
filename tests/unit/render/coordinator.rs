use super::*;
use crate::{
    foundation::core::{DisplayMetrics, Point, Size},
    overlay::model::{Overlay, StyleRef},
    render::job::{ImageTransformOptions, RenderConfiguration},
};

struct FakeWorker {
    requests: mpsc::Receiver<WorkerRequest>,
    messages: mpsc::Sender<WorkerMessage>,
}

fn harness() -> (RenderCoordinator, FakeWorker) {
    let (req_tx, req_rx) = mpsc::channel();
    let (msg_tx, msg_rx) = mpsc::channel();
    (
        RenderCoordinator::from_channels(req_tx, msg_rx),
        FakeWorker {
            requests: req_rx,
            messages: msg_tx,
        },
    )
}

fn ready() -> Workflow {
    let mut w = Workflow::new();
    for e in [
        WorkflowEvent::ImageSupplied,
        WorkflowEvent::ImageDecoded,
        WorkflowEvent::FacesDetected,
    ] {
        w.apply(e).unwrap();
    }
    w
}

fn job(overlays: usize) -> RenderJob {
    let overlays = (0..overlays)
        .map(|_| {
            Overlay::new(StyleRef::new("classic"), Point::ORIGIN, Size::new(10.0, 2.0)).unwrap()
        })
        .collect();
    RenderJob::new(
        Arc::from(vec![1u8]),
        DisplayMetrics::natural(10, 10),
        ImageTransformOptions::default(),
        overlays,
        RenderConfiguration::default(),
    )
}

fn result() -> Box<RenderResult> {
    Box::new(RenderResult {
        final_asset: b"GIF89a".to_vec(),
        preview_data_url: "data:image/gif;base64,R0lGODlh".to_string(),
        width: 10,
        height: 10,
        frame_count: 15,
        revision: 0,
    })
}

#[test]
fn dispatch_requires_ready() {
    let (mut c, worker) = harness();
    let mut w = Workflow::new();
    assert_eq!(c.dispatch(&mut w, job(1)), None);
    assert_eq!(w.state(), WorkflowState::Start);
    assert!(worker.requests.try_recv().is_err());
}

#[test]
fn dispatch_of_empty_collection_is_a_noop() {
    let (mut c, worker) = harness();
    let mut w = ready();
    assert_eq!(c.dispatch(&mut w, job(0)), None);
    assert_eq!(w.state(), WorkflowState::Ready);
    assert!(worker.requests.try_recv().is_err());
}

#[test]
fn dispatch_sends_the_snapshot_and_enters_generating() {
    let (mut c, worker) = harness();
    let mut w = ready();
    let id = c.dispatch(&mut w, job(2)).unwrap();
    assert_eq!(w.state(), WorkflowState::Generating);
    match worker.requests.try_recv().unwrap() {
        WorkerRequest::Render { job, payload } => {
            assert_eq!(job, id);
            assert_eq!(payload.overlays().len(), 2);
        }
        other => panic!("unexpected {other:?}"),
    }
    // A second dispatch while generating does nothing.
    assert_eq!(c.dispatch(&mut w, job(1)), None);
}

#[test]
fn progress_is_monotonic() {
    let (mut c, worker) = harness();
    let mut w = ready();
    let job = c.dispatch(&mut w, job(1)).unwrap();
    for percent in [10, 5, 20, 20, 150] {
        worker
            .messages
            .send(WorkerMessage::Progress { job, percent })
            .unwrap();
    }
    let events = c.poll(&mut w);
    assert_eq!(
        events,
        vec![
            CoordinatorEvent::Progress(10),
            CoordinatorEvent::Progress(20),
            CoordinatorEvent::Progress(100),
        ]
    );
    assert_eq!(c.progress(), 100);
    assert_eq!(w.state(), WorkflowState::Generating);
}

#[test]
fn finished_moves_to_done_and_counts_success() {
    let (mut c, worker) = harness();
    let mut w = ready();
    let job = c.dispatch(&mut w, job(1)).unwrap();
    worker
        .messages
        .send(WorkerMessage::Finished {
            job,
            result: result(),
        })
        .unwrap();
    assert_eq!(c.poll(&mut w), vec![CoordinatorEvent::Finished]);
    assert_eq!(w.state(), WorkflowState::Done);
    assert_eq!(c.success_count(), 1);
    assert_eq!(c.result().unwrap().final_asset, b"GIF89a");
    assert_eq!(c.current_job(), None);
}

#[test]
fn failure_returns_to_ready_with_message() {
    let (mut c, worker) = harness();
    let mut w = ready();
    let job = c.dispatch(&mut w, job(1)).unwrap();
    worker
        .messages
        .send(WorkerMessage::Failed {
            job,
            message: "boom".to_string(),
        })
        .unwrap();
    assert_eq!(
        c.poll(&mut w),
        vec![CoordinatorEvent::Failed("boom".to_string())]
    );
    assert_eq!(w.state(), WorkflowState::Ready);
    assert_eq!(c.last_error(), Some("boom"));
    assert_eq!(c.success_count(), 0);
}

#[test]
fn messages_of_a_cancelled_job_are_dropped() {
    let (mut c, worker) = harness();
    let mut w = ready();
    let old = c.dispatch(&mut w, job(1)).unwrap();
    assert!(c.cancel(&mut w));
    assert_eq!(w.state(), WorkflowState::Ready);
    let _render = worker.requests.try_recv().unwrap();
    assert!(matches!(
        worker.requests.try_recv().unwrap(),
        WorkerRequest::Cancel { job } if job == old
    ));

    let new = c.dispatch(&mut w, job(1)).unwrap();
    assert_ne!(old, new);
    worker
        .messages
        .send(WorkerMessage::Progress { job: old, percent: 90 })
        .unwrap();
    worker
        .messages
        .send(WorkerMessage::Finished {
            job: old,
            result: result(),
        })
        .unwrap();
    assert!(c.poll(&mut w).is_empty());
    assert_eq!(w.state(), WorkflowState::Generating);
    assert_eq!(c.progress(), 0);
    assert_eq!(c.success_count(), 0);
}

#[test]
fn cancel_without_job_is_noop() {
    let (mut c, _worker) = harness();
    let mut w = ready();
    assert!(!c.cancel(&mut w));
    assert_eq!(w.state(), WorkflowState::Ready);
}

#[test]
fn lost_worker_fails_the_job() {
    let (mut c, worker) = harness();
    let mut w = ready();
    c.dispatch(&mut w, job(1)).unwrap();
    drop(worker);
    let events = c.poll(&mut w);
    assert!(matches!(events.as_slice(), [CoordinatorEvent::Failed(_)]));
    assert_eq!(w.state(), WorkflowState::Ready);
}

#[test]
fn wait_returns_the_result() {
    let (mut c, worker) = harness();
    let mut w = ready();
    let job = c.dispatch(&mut w, job(1)).unwrap();
    worker
        .messages
        .send(WorkerMessage::Progress { job, percent: 50 })
        .unwrap();
    worker
        .messages
        .send(WorkerMessage::Finished {
            job,
            result: result(),
        })
        .unwrap();
    let r = c.wait(&mut w, Duration::from_secs(5)).unwrap();
    assert_eq!(r.frame_count, 15);
    assert_eq!(w.state(), WorkflowState::Done);
}

#[test]
fn wait_surfaces_failure() {
    let (mut c, worker) = harness();
    let mut w = ready();
    let job = c.dispatch(&mut w, job(1)).unwrap();
    worker
        .messages
        .send(WorkerMessage::Failed {
            job,
            message: "bad".to_string(),
        })
        .unwrap();
    assert!(matches!(
        c.wait(&mut w, Duration::from_secs(5)),
        Err(DwiError::Render(m)) if m == "bad"
    ));
    assert_eq!(w.state(), WorkflowState::Ready);
}

#[test]
fn wait_times_out() {
    let (mut c, _worker) = harness();
    let mut w = ready();
    c.dispatch(&mut w, job(1)).unwrap();
    assert!(c.wait(&mut w, Duration::from_millis(20)).is_err());
    assert_eq!(w.state(), WorkflowState::Generating);
}
