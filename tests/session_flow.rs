use std::time::Duration;

use catalog_player_lib::media::engine::sim::{EngineCall, SimulatedEngine};
use catalog_player_lib::media::engine::{MediaErrorCode, NetworkState};
use catalog_player_lib::{
    engine_event_channel, spawn_session, EngineEventKind, MediaErrorKind, MovieRecord,
    PlayRejection, PlaybackPhase, SessionConfig, SessionCoordinator, SessionError, SessionEvent,
    SessionHandle, SessionSnapshot,
};

const WAIT: Duration = Duration::from_secs(5);

fn start_session(config: SessionConfig) -> (SessionHandle, SimulatedEngine, std::thread::JoinHandle<()>) {
    let (sink, engine_events) = engine_event_channel();
    let engine = SimulatedEngine::new().with_event_sink(sink);
    let (handle, thread) =
        spawn_session(engine.clone(), engine_events, config).expect("session thread starts");
    (handle, engine, thread)
}

async fn wait_for<F>(handle: &SessionHandle, predicate: F) -> SessionSnapshot
where
    F: FnMut(&SessionSnapshot) -> bool,
{
    tokio::time::timeout(WAIT, handle.wait_until(predicate))
        .await
        .expect("snapshot reached in time")
        .expect("session still running")
}

fn rate_limit_error() -> EngineEventKind {
    EngineEventKind::Error {
        code: MediaErrorCode::Network,
        network_state: NetworkState::Idle,
        http_status: Some(429),
        message: "Too Many Requests".to_string(),
    }
}

/// Drives a session to `Ready` on source 0 with a 120s duration.
async fn ready(handle: &SessionHandle, engine: &SimulatedEngine, sources: &[&str]) {
    handle
        .initialize(sources.iter().map(|s| s.to_string()).collect())
        .await
        .unwrap();
    handle.switch(0).await.unwrap();
    wait_for(handle, |s| s.phase == PlaybackPhase::Loading).await;
    engine.emit(EngineEventKind::LoadedMetadata { duration: 120.0 });
    engine.emit(EngineEventKind::CanPlay);
    wait_for(handle, |s| s.phase == PlaybackPhase::Ready).await;
}

#[tokio::test]
async fn test_play_then_seek_through_session_thread() {
    let (handle, engine, _thread) = start_session(SessionConfig::default());
    ready(&handle, &engine, &["v1.mp4", "v2.mp4"]).await;

    handle.play_pause().await.unwrap();
    let snapshot = wait_for(&handle, |s| s.phase == PlaybackPhase::Playing).await;
    assert!(snapshot.play_pending);

    engine.resolve_play();
    wait_for(&handle, |s| !s.play_pending).await;

    handle.seek(0.5).await.unwrap();
    let snapshot = wait_for(&handle, |s| s.timing.current_time > 0.0).await;
    assert_eq!(snapshot.timing.current_time, 60.0);
    assert_eq!(snapshot.phase, PlaybackPhase::Playing);
    assert!(engine.calls().contains(&EngineCall::Seek(60.0)));
}

#[tokio::test]
async fn test_switch_announces_switching_then_loading() {
    let (handle, _engine, _thread) = start_session(SessionConfig::default());
    let mut events = handle.subscribe_events();

    handle
        .initialize(vec!["v1.mp4".to_string(), "v2.mp4".to_string()])
        .await
        .unwrap();
    handle.switch(0).await.unwrap();

    let mut phases = Vec::new();
    while !phases.contains(&PlaybackPhase::Loading) {
        let event = tokio::time::timeout(WAIT, events.recv())
            .await
            .expect("event in time")
            .expect("event channel open");
        if let SessionEvent::Status(payload) = event {
            phases.push(payload.phase);
        }
    }
    assert_eq!(phases, vec![PlaybackPhase::Switching, PlaybackPhase::Loading]);
}

#[tokio::test]
async fn test_rapid_switches_end_on_last_target() {
    let (handle, engine, _thread) = start_session(SessionConfig::default());
    ready(&handle, &engine, &["v1.mp4", "v2.mp4", "v3.mp4"]).await;
    handle.play_pause().await.unwrap();
    wait_for(&handle, |s| s.play_pending).await;

    handle.switch(1).await.unwrap();
    handle.switch(2).await.unwrap();
    // The first switch is now parked on the pending play; the old source
    // rejects it only after being superseded.
    wait_for(&handle, |s| s.phase == PlaybackPhase::Switching).await;
    engine.reject_play(PlayRejection::Interrupted("new load request".into()));

    let snapshot = wait_for(&handle, |s| {
        s.active_index == Some(2) && s.phase == PlaybackPhase::Loading
    })
    .await;
    assert!(snapshot.last_error.is_none());
    assert!(!snapshot.play_pending);
    assert_eq!(snapshot.diagnostics.suppressed_rejections, 1);

    let loads: Vec<usize> = engine
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            EngineCall::Load { index, .. } => Some(index),
            _ => None,
        })
        .collect();
    assert_eq!(loads, vec![0, 1, 2]);
    assert!(engine.max_plays_in_flight() <= 1);
}

#[tokio::test]
async fn test_stale_rate_limit_from_replaced_source_is_ignored() {
    let (handle, engine, _thread) = start_session(SessionConfig::default());
    ready(&handle, &engine, &["v1.mp4", "v2.mp4"]).await;
    let old_generation = engine.current_generation().unwrap();

    handle.switch(1).await.unwrap();
    wait_for(&handle, |s| s.active_index == Some(1) && s.phase == PlaybackPhase::Loading).await;

    engine.emit_for(old_generation, rate_limit_error());
    engine.emit(EngineEventKind::CanPlay);

    let snapshot = wait_for(&handle, |s| s.phase == PlaybackPhase::Ready).await;
    assert!(!snapshot.rate_limited);
    assert!(snapshot.diagnostics.stale_events >= 1);
}

#[tokio::test]
async fn test_rate_limit_disables_session_for_good() {
    let (handle, engine, _thread) = start_session(SessionConfig::default());
    ready(&handle, &engine, &["v1.mp4", "v2.mp4"]).await;
    handle.play_pause().await.unwrap();
    wait_for(&handle, |s| s.phase == PlaybackPhase::Playing).await;

    engine.emit(rate_limit_error());
    let snapshot = wait_for(&handle, |s| s.rate_limited).await;
    assert_eq!(snapshot.phase, PlaybackPhase::RateLimited);
    assert_eq!(
        snapshot.last_error.map(|e| e.kind),
        Some(MediaErrorKind::NetworkRateLimited)
    );
    let calls_after_trip = engine.calls().len();

    handle.play_pause().await.unwrap();
    handle.switch(1).await.unwrap();
    handle.seek(0.25).await.unwrap();
    handle.set_volume(0.3).await.unwrap();

    // Commands are applied in order, so once the volume shows up the rest ran.
    let snapshot = wait_for(&handle, |s| s.volume.level == 0.3).await;
    assert_eq!(snapshot.phase, PlaybackPhase::RateLimited);
    assert_eq!(snapshot.active_index, Some(0));
    assert_eq!(engine.calls().len(), calls_after_trip);
}

#[tokio::test]
async fn test_record_without_videos_opens_empty_session() {
    let (handle, engine, _thread) = start_session(SessionConfig::default());
    let record = MovieRecord::from_json(r#"{"_id": "x9", "title": "No Footage"}"#).unwrap();
    handle.initialize_from_record(&record).await.unwrap();
    handle.switch(0).await.unwrap();
    handle.play_pause().await.unwrap();

    let snapshot = wait_for(&handle, |s| s.diagnostics.ignored_commands == 2).await;
    assert!(!snapshot.has_media);
    assert_eq!(snapshot.phase, PlaybackPhase::Idle);
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_autoload_from_config() {
    let config = SessionConfig::from_toml_str("autoload_first_source = true").unwrap();
    let (handle, engine, _thread) = start_session(config);
    let record = MovieRecord::from_json(
        r#"{"id": "m1", "videos": ["https://cdn.example/m1.mp4"]}"#,
    )
    .unwrap();
    handle.initialize_from_record(&record).await.unwrap();

    let snapshot = wait_for(&handle, |s| s.phase == PlaybackPhase::Loading).await;
    assert_eq!(snapshot.active_index, Some(0));
    assert!(matches!(
        engine.calls().as_slice(),
        [EngineCall::Load { uri, .. }] if uri == "https://cdn.example/m1.mp4"
    ));
}

#[tokio::test]
async fn test_shutdown_releases_engine_and_closes_handle() {
    let (handle, engine, thread) = start_session(SessionConfig::default());
    ready(&handle, &engine, &["v1.mp4"]).await;

    handle.shutdown().await.unwrap();
    thread.join().expect("session thread exits cleanly");

    let calls = engine.calls();
    assert_eq!(&calls[calls.len() - 2..], &[EngineCall::Pause, EngineCall::Unload]);
    assert!(matches!(
        handle.play_pause().await,
        Err(SessionError::MpscSendError(_))
    ));
    assert!(matches!(
        handle.wait_until(|s| s.phase == PlaybackPhase::Playing).await,
        Err(SessionError::SessionClosed)
    ));
}

#[test]
fn test_invalid_config_is_rejected_before_spawning() {
    let (_sink, engine_events) = engine_event_channel();
    let config = SessionConfig {
        tick_interval_ms: 0,
        ..SessionConfig::default()
    };
    assert!(matches!(
        spawn_session(SimulatedEngine::new(), engine_events, config),
        Err(SessionError::InvalidConfig(_))
    ));
}

#[tokio::test]
async fn test_direct_coordinator_play_pause_cycle() {
    let engine = SimulatedEngine::new();
    let mut coordinator = SessionCoordinator::new(engine.clone(), SessionConfig::default());
    coordinator
        .initialize(vec!["v1.mp4".to_string(), "v2.mp4".to_string()])
        .await;
    coordinator.request_switch(0).await;
    coordinator.handle_engine_event(engine.event(EngineEventKind::CanPlay).unwrap());

    coordinator.request_play_pause().await;
    engine.resolve_play();
    coordinator.settle_pending_play().await;
    coordinator.request_play_pause().await;

    assert_eq!(coordinator.phase(), PlaybackPhase::Paused);
    assert_eq!(engine.play_count(), 1);

    let engine = coordinator.close();
    assert_eq!(engine.calls().last(), Some(&EngineCall::Unload));
}
