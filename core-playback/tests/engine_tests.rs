//! Engine integration tests against recording host fakes and a real
//! in-memory track store.

mod common;

use bridge_traits::media::MediaSignal;
use bytes::Bytes;
use common::{position_of, remote_track, test_config, wait_until, Harness, MemorySettings};
use core_library::models::{Track, TrackSource};
use core_metadata::discovery::TrackCandidate;
use core_metadata::{DurationProbe, ImportService, ProbedAudio};
use core_playback::{
    BackendEvent, PlayOutcome, PlaybackError, RepeatMode, TransportState,
};
use core_runtime::events::{CoreEvent, PlaybackEvent};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn signal(source: TrackSource, signal: MediaSignal) -> BackendEvent {
    BackendEvent { source, signal }
}

fn drain_playback_events(
    rx: &mut core_runtime::events::Receiver<CoreEvent>,
) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let CoreEvent::Playback(event) = event {
            events.push(event);
        }
    }
    events
}

// ============================================================================
// Mutual exclusion
// ============================================================================

#[tokio::test]
async fn switching_sources_stops_previous_backend_before_loading() {
    let h = Harness::new().await;
    let local = h.local_track("Local", 120.0).await;

    h.engine.play(local.clone()).await.unwrap();
    assert_eq!(h.engine.active_source(), Some(TrackSource::Local));
    assert_eq!(h.urls.live_count(), 1);

    h.clear_log();
    let remote = remote_track("Remote", "bbbbbbbbbbb");
    let outcome = h.engine.play(remote.clone()).await.unwrap();
    assert_eq!(outcome, PlayOutcome::Started { track_id: remote.id.clone() });

    assert!(!h.audio.is_loaded());
    assert_eq!(h.urls.live_count(), 0);
    assert_eq!(h.widget().loaded_id().as_deref(), Some("bbbbbbbbbbb"));
    assert_eq!(h.engine.active_source(), Some(TrackSource::Remote));
    let released = position_of(&h.log, "audio.src=none").unwrap();
    let loaded = position_of(&h.log, "widget.load:").unwrap();
    assert!(released < loaded, "local released after remote load: {:?}", h.log);

    h.clear_log();
    let other = h.local_track("Other", 90.0).await;
    h.engine.play(other).await.unwrap();

    assert_eq!(h.widget().loaded_id(), None);
    assert!(h.audio.is_loaded());
    let stopped = position_of(&h.log, "widget.stop").unwrap();
    let engaged = position_of(&h.log, "audio.src=blob:").unwrap();
    assert!(stopped < engaged);
}

#[tokio::test]
async fn concurrent_plays_leave_exactly_one_backend_loaded() {
    let h = Harness::new().await;
    let local = h.local_track("Slow blob", 60.0).await;
    let remote = remote_track("Fast", "ccccccccccc");

    let (first, second) = tokio::join!(h.engine.play(local), h.engine.play(remote.clone()));

    assert_eq!(
        second.unwrap(),
        PlayOutcome::Started { track_id: remote.id.clone() }
    );
    assert!(matches!(
        first.unwrap(),
        PlayOutcome::Superseded | PlayOutcome::Started { .. }
    ));

    let state = h.engine.snapshot();
    assert_eq!(state.current_track_id(), Some(remote.id.as_str()));
    let loaded = usize::from(h.audio.is_loaded()) + usize::from(h.widget().loaded_id().is_some());
    assert_eq!(loaded, 1);
    assert_eq!(h.urls.live_count(), 0);
}

// ============================================================================
// Play paths
// ============================================================================

struct FixedProbe(f64);

impl DurationProbe for FixedProbe {
    fn probe(&self, _data: &[u8]) -> core_metadata::Result<ProbedAudio> {
        Ok(ProbedAudio {
            duration_secs: self.0,
            mime_type: "audio/mpeg".into(),
        })
    }
}

#[tokio::test]
async fn imported_track_plays_with_measured_duration() {
    let h = Harness::new().await;
    let import = ImportService::new(h.repository.clone(), h.discovery.clone(), h.events.clone())
        .with_probe(Arc::new(FixedProbe(187.0)));
    let mut rx = h.engine.subscribe();

    let track = import
        .import_local_file("night drive.mp3", Bytes::from_static(b"ID3 fake audio"), None)
        .await
        .unwrap();
    let outcome = h.engine.play(track.clone()).await.unwrap();

    assert_eq!(outcome, PlayOutcome::Started { track_id: track.id.clone() });
    let state = h.engine.snapshot();
    assert_eq!(state.current_track_id(), Some(track.id.as_str()));
    assert_eq!(state.duration, 187.0);
    assert!(state.is_playing);
    assert_eq!(state.transport, TransportState::Playing);
    assert!(h.audio.playing.load(Ordering::SeqCst));

    let events = drain_playback_events(&mut rx);
    assert!(events.contains(&PlaybackEvent::TrackStarted {
        track_id: track.id.clone(),
        title: track.title.clone(),
        source: "local".into(),
    }));
}

#[tokio::test]
async fn unresolved_remote_track_is_resolved_before_playing() {
    let h = Harness::new().await;
    h.discovery.answer(
        "lofi beats",
        vec![
            TrackCandidate::new("No id", "Nobody", ""),
            TrackCandidate::new("Lofi Radio", "Lofi Girl", "jfKfPfyJRdk"),
        ],
    );
    let query = remote_track("lofi beats", "lofi beats");

    let outcome = h.engine.play(query.clone()).await.unwrap();

    let PlayOutcome::Started { track_id } = outcome else {
        panic!("expected playback, got {outcome:?}");
    };
    assert_ne!(track_id, query.id);
    let state = h.engine.snapshot();
    let current = state.current_track.unwrap();
    assert_eq!(current.uri, "jfKfPfyJRdk");
    assert_eq!(current.title, "Lofi Radio");
    assert_eq!(current.source, TrackSource::Remote);
    assert_eq!(h.widget().loaded_id().as_deref(), Some("jfKfPfyJRdk"));
    assert_eq!(h.discovery.searches(), 1);
}

#[tokio::test]
async fn empty_resolution_leaves_playback_untouched() {
    let h = Harness::new().await;
    let local = h.local_track("Keep me", 100.0).await;
    h.engine.play(local.clone()).await.unwrap();
    let before = h.engine.snapshot();

    let outcome = h
        .engine
        .play(remote_track("nothing matches", "nothing matches"))
        .await
        .unwrap();

    assert_eq!(outcome, PlayOutcome::ResolutionEmpty);
    assert_eq!(h.engine.snapshot(), before);
    assert_eq!(h.engine.active_source(), Some(TrackSource::Local));
    assert!(h.audio.is_loaded());
    assert_eq!(h.widget().loaded_id(), None);
}

#[tokio::test]
async fn missing_blob_keeps_current_track_and_stalls() {
    let h = Harness::new().await;
    let kept = h.local_track("Stored", 100.0).await;
    h.engine.play(kept.clone()).await.unwrap();
    let mut rx = h.engine.subscribe();

    let ghost = Track::new_local("Ghost", "Nobody", "ghost.mp3", 10.0, 0);
    let err = h.engine.play(ghost.clone()).await.unwrap_err();

    assert!(matches!(err, PlaybackError::BlobNotFound(ref id) if *id == ghost.id));
    let state = h.engine.snapshot();
    assert_eq!(state.current_track_id(), Some(kept.id.as_str()));
    assert!(!state.is_playing);
    assert_eq!(state.transport, TransportState::Stalled);
    assert_eq!(h.engine.active_source(), None);
    assert_eq!(h.urls.live_count(), 0);
    assert!(drain_playback_events(&mut rx)
        .iter()
        .any(|e| matches!(e, PlaybackEvent::Error { track_id: Some(id), .. } if *id == ghost.id)));

    // Toggling replays the kept track.
    h.engine.toggle_play().await.unwrap();
    let state = h.engine.snapshot();
    assert!(state.is_playing);
    assert_eq!(state.current_track_id(), Some(kept.id.as_str()));
    assert_eq!(h.urls.live_count(), 1);
}

#[tokio::test]
async fn sdk_that_never_loads_times_out_then_recovers() {
    let h = Harness::new().await;
    h.host.ready.store(false, Ordering::SeqCst);

    let err = h
        .engine
        .play(remote_track("Remote", "ddddddddddd"))
        .await
        .unwrap_err();

    assert!(matches!(err, PlaybackError::AdapterInitTimeout { attempts: 3 }));
    assert!(err.is_recoverable());
    assert_eq!(h.host.readiness_checks.load(Ordering::SeqCst), 3);
    assert_eq!(h.host.created.load(Ordering::SeqCst), 0);
    assert_eq!(h.engine.snapshot().transport, TransportState::Idle);

    h.host.ready.store(true, Ordering::SeqCst);
    let outcome = h
        .engine
        .play(remote_track("Remote", "ddddddddddd"))
        .await
        .unwrap();
    assert!(matches!(outcome, PlayOutcome::Started { .. }));
    assert_eq!(h.host.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_autoplay_releases_the_backend() {
    let h = Harness::new().await;
    h.audio.reject_play.store(true, Ordering::SeqCst);
    let track = h.local_track("Blocked autoplay", 30.0).await;

    let err = h.engine.play(track).await.unwrap_err();

    assert!(matches!(err, PlaybackError::Bridge(_)));
    assert_eq!(h.engine.active_source(), None);
    assert!(!h.audio.is_loaded());
    assert_eq!(h.urls.live_count(), 0);
    let state = h.engine.snapshot();
    assert!(!state.is_playing);
    assert_eq!(state.transport, TransportState::Idle);
}

// ============================================================================
// Transport
// ============================================================================

#[tokio::test]
async fn pause_when_idle_is_a_noop() {
    let h = Harness::new().await;
    let before = h.engine.snapshot();

    h.engine.pause().await;
    h.engine.pause().await;

    assert_eq!(h.engine.snapshot(), before);
    assert!(h.log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn repeated_pause_is_idempotent() {
    let h = Harness::new().await;
    let track = h.local_track("Song", 100.0).await;
    h.engine.play(track).await.unwrap();

    h.engine.pause().await;
    let once = h.engine.snapshot();
    h.engine.pause().await;

    assert_eq!(h.engine.snapshot(), once);
    assert!(!once.is_playing);
    assert_eq!(once.transport, TransportState::Paused);
}

#[tokio::test]
async fn toggle_play_flips_state_before_confirmation() {
    let h = Harness::new().await;
    let track = h.local_track("Song", 100.0).await;
    h.engine.play(track).await.unwrap();

    h.engine.toggle_play().await.unwrap();
    assert!(!h.engine.snapshot().is_playing);
    assert!(!h.audio.playing.load(Ordering::SeqCst));

    h.engine.toggle_play().await.unwrap();
    let state = h.engine.snapshot();
    assert!(state.is_playing);
    assert_eq!(state.transport, TransportState::Playing);
    let plays = h
        .log
        .lock()
        .unwrap()
        .iter()
        .filter(|e| *e == "audio.play")
        .count();
    assert_eq!(plays, 2);
}

#[tokio::test]
async fn toggle_play_without_track_does_nothing() {
    let h = Harness::new().await;
    h.engine.toggle_play().await.unwrap();
    assert_eq!(h.engine.snapshot().transport, TransportState::Idle);
    assert!(h.log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stop_clears_current_track() {
    let h = Harness::new().await;
    let track = remote_track("Remote", "eeeeeeeeeee");
    h.engine.play(track.clone()).await.unwrap();
    let mut rx = h.engine.subscribe();

    h.engine.stop().await;

    let state = h.engine.snapshot();
    assert!(state.current_track.is_none());
    assert!(!state.is_playing);
    assert_eq!(state.transport, TransportState::Idle);
    assert_eq!(h.engine.active_source(), None);
    assert_eq!(h.widget().loaded_id(), None);
    assert!(drain_playback_events(&mut rx).contains(&PlaybackEvent::Stopped {
        track_id: Some(track.id)
    }));
}

#[tokio::test]
async fn seek_targets_are_clamped_to_duration() {
    let h = Harness::new().await;
    *h.audio.duration.lock().unwrap() = 200.0;
    let track = h.local_track("Long", 200.0).await;
    h.engine.play(track).await.unwrap();

    assert_eq!(h.engine.seek(0.5).await, 100.0);
    assert_eq!(*h.audio.time.lock().unwrap(), 100.0);
    assert_eq!(h.engine.snapshot().current_time, 100.0);

    assert_eq!(h.engine.seek(1.7).await, 200.0);
    assert_eq!(h.engine.seek(-0.3).await, 0.0);
    assert_eq!(h.engine.seek(f64::NAN).await, 0.0);
}

#[tokio::test]
async fn seek_when_idle_returns_zero() {
    let h = Harness::new().await;
    assert_eq!(h.engine.seek(0.5).await, 0.0);
    assert_eq!(h.engine.snapshot().current_time, 0.0);
}

// ============================================================================
// Volume
// ============================================================================

#[tokio::test]
async fn volume_is_clamped_applied_to_both_backends_and_persisted() {
    let h = Harness::new().await;
    h.engine
        .play(remote_track("Remote", "fffffffffff"))
        .await
        .unwrap();

    assert_eq!(h.engine.set_volume(150.0).await, 100);
    assert_eq!(*h.audio.volume.lock().unwrap(), 1.0);
    assert_eq!(h.widget().volume.load(Ordering::SeqCst), 100);
    assert_eq!(h.settings.raw("vs_volume").as_deref(), Some("100"));

    assert_eq!(h.engine.set_volume(-5.0).await, 0);
    assert_eq!(h.widget().volume.load(Ordering::SeqCst), 0);

    assert_eq!(h.engine.set_volume(42.4).await, 42);
    assert_eq!(h.engine.snapshot().volume, 42);
    assert!((*h.audio.volume.lock().unwrap() - 0.42).abs() < 1e-9);
    assert_eq!(h.widget().volume.load(Ordering::SeqCst), 42);
    assert_eq!(h.settings.raw("vs_volume").as_deref(), Some("42"));
}

#[tokio::test]
async fn volume_survives_failed_persistence() {
    let h = Harness::new().await;
    h.settings.fail_writes.store(true, Ordering::SeqCst);

    assert_eq!(h.engine.set_volume(30.0).await, 30);
    assert_eq!(h.engine.snapshot().volume, 30);
    assert_eq!(h.settings.raw("vs_volume"), None);
}

#[tokio::test]
async fn widget_created_later_gets_remembered_volume() {
    let h = Harness::new().await;
    h.engine.set_volume(25.0).await;

    h.engine
        .play(remote_track("Remote", "ggggggggggg"))
        .await
        .unwrap();

    assert_eq!(h.widget().volume.load(Ordering::SeqCst), 25);
}

#[tokio::test]
async fn start_restores_persisted_volume() {
    let h = Harness::build(test_config(), MemorySettings::with_i64("vs_volume", 35)).await;
    h.engine.start().await.unwrap();

    assert_eq!(h.engine.snapshot().volume, 35);
    assert_eq!(*h.audio.volume.lock().unwrap(), 0.35);

    assert!(matches!(
        h.engine.start().await,
        Err(PlaybackError::AlreadyStarted)
    ));
    h.engine.shutdown().await;
}

#[tokio::test]
async fn out_of_range_persisted_volume_is_clamped() {
    let h = Harness::build(test_config(), MemorySettings::with_i64("vs_volume", 500)).await;
    h.engine.start().await.unwrap();
    assert_eq!(h.engine.snapshot().volume, 100);
    h.engine.shutdown().await;
}

#[tokio::test]
async fn unmuting_a_session_that_started_muted_uses_default() {
    let h = Harness::build(test_config(), MemorySettings::with_i64("vs_volume", 0)).await;
    h.engine.start().await.unwrap();
    assert_eq!(h.engine.snapshot().volume, 0);

    assert_eq!(h.engine.toggle_mute().await, 80);
    h.engine.shutdown().await;
}

#[tokio::test]
async fn toggle_mute_restores_last_audible_volume() {
    let h = Harness::new().await;
    h.engine.set_volume(55.0).await;

    assert_eq!(h.engine.toggle_mute().await, 0);
    assert_eq!(h.engine.snapshot().volume, 0);
    assert_eq!(h.engine.toggle_mute().await, 55);
}

// ============================================================================
// Modes
// ============================================================================

#[tokio::test]
async fn repeat_mode_cycles_and_shuffle_toggles() {
    let h = Harness::new().await;

    assert_eq!(h.engine.cycle_repeat_mode(), RepeatMode::One);
    assert_eq!(h.engine.cycle_repeat_mode(), RepeatMode::All);
    assert_eq!(h.engine.cycle_repeat_mode(), RepeatMode::Off);

    assert!(h.engine.toggle_shuffle());
    assert!(!h.engine.toggle_shuffle());
}

#[tokio::test]
async fn refresh_track_updates_only_the_current_track() {
    let h = Harness::new().await;
    let track = h.local_track("Old title", 50.0).await;
    h.engine.play(track.clone()).await.unwrap();

    let mut edited = track.clone();
    edited.title = "New title".into();
    assert!(h.engine.refresh_track(&edited));
    assert_eq!(
        h.engine.snapshot().current_track.unwrap().title,
        "New title"
    );

    let stranger = Track::new_local("Other", "Other", "o.mp3", 1.0, 0);
    assert!(!h.engine.refresh_track(&stranger));
}

// ============================================================================
// Backend signals
// ============================================================================

#[tokio::test]
async fn end_without_repeat_parks_at_the_end() {
    let h = Harness::new().await;
    let track = h.local_track("Finite", 120.0).await;
    h.engine.play(track.clone()).await.unwrap();
    let mut rx = h.engine.subscribe();

    h.engine
        .handle_backend_event(signal(TrackSource::Local, MediaSignal::Ended))
        .await;

    let state = h.engine.snapshot();
    assert!(!state.is_playing);
    assert_eq!(state.current_time, 120.0);
    assert_eq!(state.transport, TransportState::Paused);
    assert_eq!(state.current_track_id(), Some(track.id.as_str()));
    assert!(h.audio.is_loaded());
    assert!(drain_playback_events(&mut rx).contains(&PlaybackEvent::Ended {
        track_id: track.id
    }));
}

#[tokio::test]
async fn repeat_one_replays_on_end() {
    let h = Harness::new().await;
    h.engine.set_repeat_mode(RepeatMode::One);
    let track = h.local_track("Loop", 60.0).await;
    h.engine.play(track.clone()).await.unwrap();

    h.engine
        .handle_backend_event(signal(TrackSource::Local, MediaSignal::Ended))
        .await;

    let state = h.engine.snapshot();
    assert!(state.is_playing);
    assert_eq!(state.current_track_id(), Some(track.id.as_str()));
    assert_eq!(state.current_time, 0.0);
    assert!(h.urls.revoked.lock().unwrap().contains(&"blob:1".to_string()));
    assert!(h.urls.live.lock().unwrap().contains("blob:2"));
}

#[tokio::test]
async fn signals_from_inactive_backend_are_ignored() {
    let h = Harness::new().await;
    let track = h.local_track("Local", 100.0).await;
    h.engine.play(track).await.unwrap();
    let before = h.engine.snapshot();

    h.engine
        .handle_backend_event(signal(TrackSource::Remote, MediaSignal::Error { code: 101 }))
        .await;
    h.engine
        .handle_backend_event(signal(TrackSource::Remote, MediaSignal::Paused))
        .await;

    assert_eq!(h.engine.snapshot(), before);
    assert_eq!(h.discovery.alternatives(), 0);

    h.engine
        .handle_backend_event(signal(TrackSource::Local, MediaSignal::Paused))
        .await;
    let state = h.engine.snapshot();
    assert!(!state.is_playing);
    assert_eq!(state.transport, TransportState::Paused);
}

#[tokio::test]
async fn ready_signal_fills_in_remote_duration() {
    let h = Harness::new().await;
    h.engine
        .play(remote_track("Remote", "hhhhhhhhhhh"))
        .await
        .unwrap();
    assert_eq!(h.engine.snapshot().duration, 0.0);

    h.engine
        .handle_backend_event(signal(
            TrackSource::Remote,
            MediaSignal::Ready { duration: f64::NAN },
        ))
        .await;
    assert_eq!(h.engine.snapshot().duration, 0.0);

    h.engine
        .handle_backend_event(signal(
            TrackSource::Remote,
            MediaSignal::Ready { duration: 245.0 },
        ))
        .await;
    assert_eq!(h.engine.snapshot().duration, 245.0);
}

#[tokio::test]
async fn fatal_media_error_stalls_without_healing() {
    let h = Harness::new().await;
    let track = h.local_track("Corrupt", 40.0).await;
    h.engine.play(track.clone()).await.unwrap();
    let mut rx = h.engine.subscribe();

    h.engine
        .handle_backend_event(signal(TrackSource::Local, MediaSignal::Error { code: 4 }))
        .await;

    let state = h.engine.snapshot();
    assert!(!state.is_playing);
    assert_eq!(state.transport, TransportState::Stalled);
    assert_eq!(state.current_track_id(), Some(track.id.as_str()));
    assert_eq!(h.engine.active_source(), None);
    assert_eq!(h.urls.live_count(), 0);
    assert_eq!(h.discovery.alternatives(), 0);
    assert!(drain_playback_events(&mut rx)
        .iter()
        .any(|e| matches!(e, PlaybackEvent::Stalled { .. })));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn pump_delivers_host_signals_after_start() {
    let h = Harness::new().await;
    h.engine.start().await.unwrap();
    let track = h.local_track("Pumped", 80.0).await;
    h.engine.play(track).await.unwrap();

    h.audio.emit(MediaSignal::Paused);

    let state = wait_until(&h.engine, |s| !s.is_playing).await;
    assert_eq!(state.transport, TransportState::Paused);
    h.engine.shutdown().await;
}

#[tokio::test]
async fn poller_syncs_position_only_while_playing() {
    let config = core_playback::EngineConfig {
        poll_interval: Duration::from_millis(20),
        ..test_config()
    };
    let h = Harness::build(config, MemorySettings::default()).await;
    h.engine.start().await.unwrap();
    h.engine
        .play(remote_track("Remote", "iiiiiiiiiii"))
        .await
        .unwrap();
    *h.widget().duration.lock().unwrap() = 300.0;
    *h.widget().time.lock().unwrap() = 42.0;

    let state = wait_until(&h.engine, |s| s.current_time == 42.0).await;
    assert_eq!(state.duration, 300.0);

    h.engine.pause().await;
    *h.widget().time.lock().unwrap() = 50.0;
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(h.engine.snapshot().current_time, 42.0);

    h.engine.shutdown().await;
}

#[tokio::test]
async fn shutdown_stops_active_backend_and_is_idempotent() {
    let h = Harness::new().await;
    h.engine.start().await.unwrap();
    let track = h.local_track("Last", 10.0).await;
    h.engine.play(track).await.unwrap();

    h.engine.shutdown().await;
    h.engine.shutdown().await;

    assert_eq!(h.engine.active_source(), None);
    assert_eq!(h.urls.live_count(), 0);
    assert!(!h.engine.snapshot().is_playing);
}

#[tokio::test]
async fn empty_resolution_settles_a_load_it_superseded() {
    let config = core_playback::EngineConfig {
        sdk_retry_interval: Duration::from_millis(10),
        sdk_max_attempts: 200,
        ..test_config()
    };
    let h = Harness::build(config, MemorySettings::default()).await;
    let local = h.local_track("X", 120.0).await;
    h.engine.play(local.clone()).await.unwrap();

    h.host.ready.store(false, Ordering::SeqCst);
    let engine = h.engine.clone();
    let slow = tokio::spawn(async move { engine.play(remote_track("Y", "yyyyyyyyyyy")).await });
    wait_until(&h.engine, |s| s.transport == TransportState::Loading).await;

    let outcome = h
        .engine
        .play(remote_track("Query", "nothing matches this"))
        .await
        .unwrap();
    assert_eq!(outcome, PlayOutcome::ResolutionEmpty);

    let state = h.engine.snapshot();
    assert_eq!(state.transport, TransportState::Stalled);
    assert!(!state.is_playing);
    assert_eq!(state.current_track_id(), Some(local.id.as_str()));

    h.host.ready.store(true, Ordering::SeqCst);
    assert_eq!(slow.await.unwrap().unwrap(), PlayOutcome::Superseded);
    assert_eq!(h.widget().loaded_id(), None);
    assert_eq!(h.engine.snapshot().transport, TransportState::Stalled);
    assert_eq!(h.engine.active_source(), None);
}

#[tokio::test]
async fn local_track_without_stored_duration_resets_duration() {
    let h = Harness::new().await;
    let long = h.local_track("Long", 300.0).await;
    h.engine.play(long).await.unwrap();
    assert_eq!(h.engine.snapshot().duration, 300.0);

    let unknown = h.local_track("Unknown", 0.0).await;
    h.engine.play(unknown.clone()).await.unwrap();

    let state = h.engine.snapshot();
    assert_eq!(state.current_track_id(), Some(unknown.id.as_str()));
    assert_eq!(state.duration, 0.0);
}
