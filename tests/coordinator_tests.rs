use janus::scramble::transform;
use janus::{
    CancelToken, Frame, FrameCoordinator, Key, KeySearchEngine, Mode, ScrambleDirection,
    ScrambleError, SearchBounds,
};

fn lattice_path() -> Frame {
    Frame::from_fn(384, 1, 2, |y, row| {
        row[0] = y.min(255) as u8;
        row[1] = y.saturating_sub(255) as u8;
    })
}

fn engine() -> KeySearchEngine {
    KeySearchEngine::new(SearchBounds::new(7, 7), 2, 16).unwrap()
}

#[test]
fn test_begin_search_without_frame() {
    let coordinator = FrameCoordinator::with_settings(Mode::Forward, Key::new(1, 2));
    assert!(matches!(
        coordinator.begin_search(&engine()),
        Err(ScrambleError::SnapshotUnavailable)
    ));
    assert_eq!(coordinator.settings(), (Mode::Forward, Key::new(1, 2)));
    assert!(!coordinator.take_restart());
}

#[test]
fn test_frames_follow_mode_and_key() {
    let coordinator = FrameCoordinator::new();
    let frame = lattice_path();
    let key = Key::new(12, 4);

    coordinator.set_key(key);
    coordinator.set_mode(Mode::Forward);
    let pair = coordinator.on_frame_acquired(frame.clone());
    assert_eq!(pair.original, frame);
    assert_eq!(
        pair.transformed,
        transform(&frame, key, ScrambleDirection::Forward)
    );

    coordinator.set_mode(Mode::Inverse);
    let pair = coordinator.on_frame_acquired(pair.transformed);
    assert_eq!(pair.transformed, frame);
}

#[test]
fn test_search_result_applies_inverse_and_restart() {
    let key = Key::new(5, 3);
    let coordinator = FrameCoordinator::new();
    coordinator.on_frame_acquired(transform(&lattice_path(), key, ScrambleDirection::Forward));

    let handle = coordinator.begin_search(&engine()).unwrap();
    let result = coordinator.complete_search(handle).unwrap().unwrap();
    assert_eq!(result.key, key);
    assert_eq!(coordinator.settings(), (Mode::Inverse, key));
    assert!(coordinator.take_restart());
}

#[test]
fn test_superseded_search_is_discarded() {
    let key = Key::new(2, 6);
    let coordinator = FrameCoordinator::with_settings(Mode::Passthrough, Key::new(9, 9));
    coordinator.on_frame_acquired(transform(&lattice_path(), key, ScrambleDirection::Forward));

    let first = coordinator.begin_search(&engine()).unwrap();
    let second = coordinator.begin_search(&engine()).unwrap();
    assert!(first.cancel_token().is_cancelled());

    assert!(coordinator.complete_search(first).unwrap().is_none());
    assert_eq!(coordinator.settings(), (Mode::Passthrough, Key::new(9, 9)));
    assert!(!coordinator.take_restart());

    let result = coordinator.complete_search(second).unwrap().unwrap();
    assert_eq!(result.key, key);
    assert_eq!(coordinator.mode(), Mode::Inverse);
}

#[test]
fn test_mode_change_cancels_search() {
    let coordinator = FrameCoordinator::new();
    coordinator.on_frame_acquired(lattice_path());
    let handle = coordinator.begin_search(&engine()).unwrap();

    coordinator.set_mode(Mode::Forward);
    assert!(handle.cancel_token().is_cancelled());
    assert!(coordinator.complete_search(handle).unwrap().is_none());
    assert_eq!(coordinator.mode(), Mode::Forward);
}

#[test]
fn test_new_video_cancels_search_and_drops_snapshot() {
    let coordinator = FrameCoordinator::new();
    coordinator.on_frame_acquired(lattice_path());
    let handle = coordinator.begin_search(&engine()).unwrap();

    coordinator.reset_for_new_video();
    assert!(handle.cancel_token().is_cancelled());
    assert!(!coordinator.has_snapshot());
    assert!(coordinator.complete_search(handle).unwrap().is_none());
    assert_eq!(coordinator.mode(), Mode::Passthrough);
}

#[test]
fn test_snapshot_is_independent_copy() {
    let coordinator = FrameCoordinator::new();
    let first = lattice_path();
    coordinator.on_frame_acquired(first.clone());
    let snapshot = coordinator.snapshot_for_search().unwrap();

    coordinator.on_frame_acquired(Frame::new(4, 1, 2));
    assert_eq!(snapshot, first);
    assert_eq!(coordinator.snapshot_for_search().unwrap().height(), 4);
}

#[test]
fn test_engine_search_uses_own_token() {
    let coordinator = FrameCoordinator::new();
    coordinator.on_frame_acquired(lattice_path());
    let snapshot = coordinator.snapshot_for_search().unwrap();
    let result = engine()
        .search(Some(&snapshot), &CancelToken::new(), |_| {})
        .unwrap();
    assert_eq!(result.key, Key::new(0, 0));
}
