// Tabs of one origin converge on the same session through the shared store.

mod common;

use common::{config, next_transition, Tab, T0};
use meeting_continuity::{
    CaptureCommand, CrossTabSynchronizer, InFlightRegistry, ManualClock, MemoryOrigin,
    PersistedSessionRecord, RecordingState, RestoreOutcome, SessionError, TransitionSource,
};
use std::sync::Arc;

#[tokio::test]
async fn test_observer_tab_follows_host_clock() {
    let origin = MemoryOrigin::new();
    let clock = Arc::new(ManualClock::new(T0));
    let mut host = Tab::open(&origin, &clock);
    let mut guest = Tab::open(&origin, &clock);

    let host_view = host.mount(config("standup", "alice", "alice")).await;
    host_view.controller().start().await.unwrap();
    clock.advance_secs(30);

    let guest_view = guest.mount(config("standup", "bob", "alice")).await;
    assert_eq!(
        guest_view.restore_outcome(),
        &RestoreOutcome::Observing { elapsed_seconds: 30 }
    );
    let mut guest_transitions = guest_view.controller().subscribe_transitions();

    clock.advance_secs(10);
    host_view.controller().pause().await.unwrap();
    let paused = next_transition(&mut guest_transitions).await;
    assert_eq!(paused.to, RecordingState::Paused);
    assert_eq!(paused.source, TransitionSource::Remote);
    assert!(!paused.owned);

    // The pause freezes both clocks
    clock.advance_secs(100);
    assert_eq!(host_view.controller().elapsed_seconds().await, 40);
    assert_eq!(guest_view.controller().elapsed_seconds().await, 40);

    host_view.controller().resume().await.unwrap();
    next_transition(&mut guest_transitions).await;
    clock.advance_secs(50);
    assert_eq!(host_view.controller().elapsed_seconds().await, 90);
    assert_eq!(guest_view.controller().elapsed_seconds().await, 90);

    host_view.controller().stop().await.unwrap();
    let stopped = next_transition(&mut guest_transitions).await;
    assert_eq!(stopped.to, RecordingState::Stopped);
    assert_eq!(stopped.elapsed_seconds, 90);
    assert_eq!(
        guest_view.controller().snapshot().await.state,
        RecordingState::Stopped
    );

    // Only the owning tab generates minutes
    assert_eq!(common::next(&mut host.minutes_calls).await, ("standup".to_string(), 90));
    common::assert_quiet(&mut guest.minutes_calls).await;

    assert!(guest.capture.calls().is_empty(), "observer never drives capture");
}

#[tokio::test]
async fn test_tab_mounted_before_start_picks_up_recording() {
    let origin = MemoryOrigin::new();
    let clock = Arc::new(ManualClock::new(T0));
    let host = Tab::open(&origin, &clock);
    let guest = Tab::open(&origin, &clock);

    let guest_view = guest.mount(config("standup", "bob", "alice")).await;
    assert_eq!(guest_view.restore_outcome(), &RestoreOutcome::NothingToRestore);
    let mut transitions = guest_view.controller().subscribe_transitions();

    let host_view = host.mount(config("standup", "alice", "alice")).await;
    host_view.controller().start().await.unwrap();

    let started = next_transition(&mut transitions).await;
    assert_eq!(started.from, RecordingState::Idle);
    assert_eq!(started.to, RecordingState::Recording);

    clock.advance_secs(12);
    assert_eq!(guest_view.controller().elapsed_seconds().await, 12);
}

#[tokio::test]
async fn test_observer_cannot_drive_capture() {
    let origin = MemoryOrigin::new();
    let clock = Arc::new(ManualClock::new(T0));
    let host = Tab::open(&origin, &clock);
    let guest = Tab::open(&origin, &clock);

    let host_view = host.mount(config("standup", "alice", "alice")).await;
    host_view.controller().start().await.unwrap();
    let guest_view = guest.mount(config("standup", "bob", "alice")).await;

    assert!(matches!(
        guest_view.controller().pause().await,
        Err(SessionError::NotOwner { .. })
    ));
    assert!(matches!(
        guest_view.controller().stop().await,
        Err(SessionError::NotOwner { .. })
    ));
    assert!(matches!(
        guest_view.controller().retry_capture().await,
        Err(SessionError::NotOwner { .. })
    ));
    assert_eq!(
        host_view.controller().snapshot().await.state,
        RecordingState::Recording
    );
}

#[tokio::test]
async fn test_stale_records_are_ignored() {
    let origin = MemoryOrigin::new();
    let clock = Arc::new(ManualClock::new(T0));
    let tab = Tab::open(&origin, &clock);

    let view = tab.mount(config("standup", "alice", "alice")).await;
    clock.advance_secs(5);
    view.controller().start().await.unwrap();
    let current = view.controller().snapshot().await;

    let stale = PersistedSessionRecord {
        state: RecordingState::Paused,
        pause_started_at: Some(T0),
        last_write_at: current.last_write_at - 1,
        ..PersistedSessionRecord::from_session(&current, "other-tab")
    };
    assert!(!CrossTabSynchronizer::apply(view.controller(), Some(&stale)).await);

    let same_instant = PersistedSessionRecord {
        last_write_at: current.last_write_at,
        ..stale.clone()
    };
    assert!(!CrossTabSynchronizer::apply(view.controller(), Some(&same_instant)).await);
    assert_eq!(view.controller().snapshot().await, current);

    let newer = PersistedSessionRecord {
        accumulated_pause_ms: 2_000,
        last_write_at: current.last_write_at + 1,
        ..PersistedSessionRecord::from_session(&current, "other-tab")
    };
    assert!(CrossTabSynchronizer::apply(view.controller(), Some(&newer)).await);
    assert_eq!(view.controller().snapshot().await.accumulated_pause_ms, 2_000);
}

#[tokio::test]
async fn test_owner_ignores_foreign_removal() {
    let origin = MemoryOrigin::new();
    let clock = Arc::new(ManualClock::new(T0));
    let tab = Tab::open(&origin, &clock);

    let view = tab.mount(config("standup", "alice", "alice")).await;
    view.controller().start().await.unwrap();

    assert!(!CrossTabSynchronizer::apply(view.controller(), None).await);
    assert_eq!(
        view.controller().snapshot().await.state,
        RecordingState::Recording
    );

    // Still stoppable, and stopping still drives the device
    view.controller().stop().await.unwrap();
    assert_eq!(tab.capture.count(CaptureCommand::Stop), 1);
}

#[tokio::test]
async fn test_removal_without_session_is_ignored() {
    let origin = MemoryOrigin::new();
    let clock = Arc::new(ManualClock::new(T0));
    let tab = Tab::open(&origin, &clock);

    let view = tab.mount(config("standup", "bob", "alice")).await;
    assert!(!CrossTabSynchronizer::apply(view.controller(), None).await);
    assert_eq!(view.controller().snapshot().await.state, RecordingState::Idle);
}

#[tokio::test]
async fn test_corrupt_record_is_skipped() {
    use meeting_continuity::KeyValueStore;

    let origin = MemoryOrigin::new();
    let clock = Arc::new(ManualClock::new(T0));
    let writer = origin.tab();
    let tab = Tab::open(&origin, &clock);

    writer
        .set("recording-session.standup", "{not json".to_string())
        .await
        .unwrap();

    let view = tab.mount(config("standup", "alice", "alice")).await;
    assert_eq!(view.restore_outcome(), &RestoreOutcome::NothingToRestore);
    assert!(tab.capture.calls().is_empty());
}

#[tokio::test]
async fn test_tabs_in_other_meetings_are_unaffected() {
    let origin = MemoryOrigin::new();
    let clock = Arc::new(ManualClock::new(T0));
    let first = Tab::open(&origin, &clock);
    let second = Tab::with_store(Arc::new(origin.tab()), &clock, InFlightRegistry::new());

    let standup = first.mount(config("standup", "alice", "alice")).await;
    let retro = second.mount(config("retro", "alice", "alice")).await;

    standup.controller().start().await.unwrap();
    clock.advance_secs(20);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert_eq!(retro.controller().snapshot().await.state, RecordingState::Idle);
    assert_eq!(retro.controller().elapsed_seconds().await, 0);
}

#[tokio::test]
async fn test_inconsistent_records_are_never_adopted() {
    use meeting_continuity::KeyValueStore;

    let origin = MemoryOrigin::new();
    let clock = Arc::new(ManualClock::new(T0));
    let writer = origin.tab();
    let tab = Tab::open(&origin, &clock);

    let view = tab.mount(config("standup", "bob", "alice")).await;
    let mut transitions = view.controller().subscribe_transitions();

    let broken = PersistedSessionRecord {
        meeting_id: "standup".to_string(),
        state: RecordingState::Recording,
        started_at: None,
        accumulated_pause_ms: -5_000,
        pause_started_at: None,
        last_write_at: T0 + 1_000,
        writer: "other-tab".to_string(),
    };
    assert!(!CrossTabSynchronizer::apply(view.controller(), Some(&broken)).await);

    writer
        .set(
            "recording-session.standup",
            serde_json::to_string(&broken).unwrap(),
        )
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert!(transitions.try_recv().is_err());
    assert_eq!(view.controller().snapshot().await.state, RecordingState::Idle);
    assert_eq!(view.controller().elapsed_seconds().await, 0);

    // A reload does not restore it either
    let reloaded = Tab::open(&origin, &clock);
    let view = reloaded.mount(config("standup", "alice", "alice")).await;
    assert_eq!(view.restore_outcome(), &RestoreOutcome::NothingToRestore);
    assert!(reloaded.capture.calls().is_empty());
}

#[tokio::test]
async fn test_far_past_start_does_not_break_status() {
    let origin = MemoryOrigin::new();
    let clock = Arc::new(ManualClock::new(T0));
    let tab = Tab::open(&origin, &clock);
    let view = tab.mount(config("standup", "bob", "alice")).await;

    let ancient = PersistedSessionRecord {
        meeting_id: "standup".to_string(),
        state: RecordingState::Recording,
        started_at: Some(i64::MIN + 5),
        accumulated_pause_ms: 0,
        pause_started_at: None,
        last_write_at: T0,
        writer: "other-tab".to_string(),
    };
    assert!(CrossTabSynchronizer::apply(view.controller(), Some(&ancient)).await);

    let status = view.controller().status().await;
    assert_eq!(status.state, RecordingState::Recording);
    assert!(status.elapsed_seconds > 0);
}
