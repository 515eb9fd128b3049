//! Shared fakes for the playback integration tests.
//!
//! Host media primitives record every call into one ordered log so tests can
//! assert cross-backend ordering (stop A before engaging B).

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::media::{
    AudioElement, MediaListener, MediaSignal, ObjectUrlFactory, StreamWidget, StreamWidgetHost,
};
use bridge_traits::storage::SettingsStore;
use bridge_traits::time::FixedClock;
use bytes::Bytes;
use core_library::db::create_test_pool;
use core_library::models::{AudioBlob, Track};
use core_library::{SqliteTrackRepository, TrackRepository};
use core_metadata::discovery::{DiscoveryService, FileAnalysis, TrackCandidate};
use core_metadata::Result as MetadataResult;
use core_playback::{EngineConfig, EngineDeps, PlaybackEngine, PlayerState};
use core_runtime::events::EventBus;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub type CallLog = Arc<Mutex<Vec<String>>>;

fn record(log: &CallLog, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

/// Index of the first log entry starting with `prefix`.
pub fn position_of(log: &CallLog, prefix: &str) -> Option<usize> {
    log.lock().unwrap().iter().position(|e| e.starts_with(prefix))
}

// ============================================================================
// Audio element + object URLs
// ============================================================================

pub struct FakeAudio {
    log: CallLog,
    listener: Mutex<Option<Arc<dyn MediaListener>>>,
    pub source: Mutex<Option<String>>,
    pub time: Mutex<f64>,
    pub duration: Mutex<f64>,
    pub volume: Mutex<f64>,
    pub playing: AtomicBool,
    pub reject_play: AtomicBool,
}

impl FakeAudio {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            listener: Mutex::new(None),
            source: Mutex::new(None),
            time: Mutex::new(0.0),
            duration: Mutex::new(0.0),
            volume: Mutex::new(1.0),
            playing: AtomicBool::new(false),
            reject_play: AtomicBool::new(false),
        }
    }

    pub fn emit(&self, signal: MediaSignal) {
        let listener = self.listener.lock().unwrap().clone();
        if let Some(listener) = listener {
            listener.on_signal(signal);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.source.lock().unwrap().is_some()
    }
}

#[async_trait]
impl AudioElement for FakeAudio {
    fn attach_listener(&self, listener: Arc<dyn MediaListener>) {
        *self.listener.lock().unwrap() = Some(listener);
    }

    fn set_source(&self, url: Option<&str>) {
        record(&self.log, format!("audio.src={}", url.unwrap_or("none")));
        *self.source.lock().unwrap() = url.map(str::to_string);
        self.playing.store(false, Ordering::SeqCst);
    }

    async fn play(&self) -> BridgeResult<()> {
        if self.reject_play.load(Ordering::SeqCst) {
            return Err(BridgeError::Media {
                code: 0,
                message: "NotAllowedError".into(),
            });
        }
        record(&self.log, "audio.play");
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) {
        record(&self.log, "audio.pause");
        self.playing.store(false, Ordering::SeqCst);
    }

    fn set_current_time(&self, seconds: f64) {
        *self.time.lock().unwrap() = seconds;
    }

    fn current_time(&self) -> f64 {
        *self.time.lock().unwrap()
    }

    fn duration(&self) -> f64 {
        *self.duration.lock().unwrap()
    }

    fn set_volume(&self, volume: f64) {
        *self.volume.lock().unwrap() = volume;
    }
}

#[derive(Default)]
pub struct FakeUrls {
    next: AtomicUsize,
    pub live: Mutex<HashSet<String>>,
    pub revoked: Mutex<Vec<String>>,
}

impl FakeUrls {
    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }
}

impl ObjectUrlFactory for FakeUrls {
    fn create_object_url(&self, _data: Bytes, _mime_type: Option<&str>) -> BridgeResult<String> {
        let url = format!("blob:{}", self.next.fetch_add(1, Ordering::SeqCst) + 1);
        self.live.lock().unwrap().insert(url.clone());
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) {
        self.live.lock().unwrap().remove(url);
        self.revoked.lock().unwrap().push(url.to_string());
    }
}

// ============================================================================
// Streaming widget
// ============================================================================

pub struct FakeWidget {
    log: CallLog,
    pub loaded: Mutex<Option<String>>,
    pub playing: AtomicBool,
    pub time: Mutex<f64>,
    pub duration: Mutex<f64>,
    pub volume: AtomicU8,
    pub last_seek: Mutex<Option<f64>>,
}

impl FakeWidget {
    pub fn loaded_id(&self) -> Option<String> {
        self.loaded.lock().unwrap().clone()
    }
}

impl StreamWidget for FakeWidget {
    fn load_video_by_id(&self, video_id: &str) {
        record(&self.log, format!("widget.load:{video_id}"));
        *self.loaded.lock().unwrap() = Some(video_id.to_string());
        *self.time.lock().unwrap() = 0.0;
    }

    fn play_video(&self) {
        record(&self.log, "widget.play");
        self.playing.store(true, Ordering::SeqCst);
    }

    fn pause_video(&self) {
        record(&self.log, "widget.pause");
        self.playing.store(false, Ordering::SeqCst);
    }

    fn stop_video(&self) {
        record(&self.log, "widget.stop");
        self.playing.store(false, Ordering::SeqCst);
        *self.loaded.lock().unwrap() = None;
    }

    fn seek_to(&self, seconds: f64, _allow_seek_ahead: bool) {
        *self.last_seek.lock().unwrap() = Some(seconds);
        *self.time.lock().unwrap() = seconds;
    }

    fn current_time(&self) -> f64 {
        *self.time.lock().unwrap()
    }

    fn duration(&self) -> f64 {
        *self.duration.lock().unwrap()
    }

    fn set_volume(&self, volume: u8) {
        self.volume.store(volume, Ordering::SeqCst);
    }
}

pub struct FakeWidgetHost {
    pub ready: AtomicBool,
    pub readiness_checks: AtomicUsize,
    pub created: AtomicUsize,
    pub widget: Arc<FakeWidget>,
    listener: Mutex<Option<Arc<dyn MediaListener>>>,
}

impl FakeWidgetHost {
    pub fn new(log: CallLog, ready: bool) -> Self {
        Self {
            ready: AtomicBool::new(ready),
            readiness_checks: AtomicUsize::new(0),
            created: AtomicUsize::new(0),
            widget: Arc::new(FakeWidget {
                log,
                loaded: Mutex::new(None),
                playing: AtomicBool::new(false),
                time: Mutex::new(0.0),
                duration: Mutex::new(0.0),
                volume: AtomicU8::new(100),
                last_seek: Mutex::new(None),
            }),
            listener: Mutex::new(None),
        }
    }

    pub fn emit(&self, signal: MediaSignal) {
        let listener = self.listener.lock().unwrap().clone();
        if let Some(listener) = listener {
            listener.on_signal(signal);
        }
    }
}

#[async_trait]
impl StreamWidgetHost for FakeWidgetHost {
    fn is_sdk_ready(&self) -> bool {
        self.readiness_checks.fetch_add(1, Ordering::SeqCst);
        self.ready.load(Ordering::SeqCst)
    }

    async fn create_widget(
        &self,
        listener: Arc<dyn MediaListener>,
    ) -> BridgeResult<Arc<dyn StreamWidget>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        *self.listener.lock().unwrap() = Some(listener);
        Ok(self.widget.clone())
    }
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
    pub fail_writes: AtomicBool,
}

impl MemorySettings {
    pub fn with_i64(key: &str, value: i64) -> Self {
        let settings = Self::default();
        settings
            .values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        settings
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn write(&self, key: &str, value: String) -> BridgeResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("quota exceeded".into()));
        }
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.write(key, value.to_string())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.raw(key))
    }

    async fn set_i64(&self, key: &str, value: i64) -> BridgeResult<()> {
        self.write(key, value.to_string())
    }

    async fn get_i64(&self, key: &str) -> BridgeResult<Option<i64>> {
        Ok(self.raw(key).and_then(|v| v.parse().ok()))
    }

    async fn set_bool(&self, key: &str, value: bool) -> BridgeResult<()> {
        self.write(key, value.to_string())
    }

    async fn get_bool(&self, key: &str) -> BridgeResult<Option<bool>> {
        Ok(self.raw(key).and_then(|v| v.parse().ok()))
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Discovery double with canned answers and call counters.
#[derive(Default)]
pub struct ScriptedDiscovery {
    results: Mutex<HashMap<String, Vec<TrackCandidate>>>,
    alternative: Mutex<Option<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
    pub search_calls: AtomicUsize,
    pub alternative_calls: AtomicUsize,
}

impl ScriptedDiscovery {
    pub fn answer(&self, query: &str, candidates: Vec<TrackCandidate>) {
        self.results
            .lock()
            .unwrap()
            .insert(query.to_string(), candidates);
    }

    pub fn set_alternative(&self, query: Option<&str>) {
        *self.alternative.lock().unwrap() = query.map(str::to_string);
    }

    /// Makes the next alternative queries wait until the returned handle is
    /// notified.
    pub fn hold_alternatives(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn alternatives(&self) -> usize {
        self.alternative_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiscoveryService for ScriptedDiscovery {
    async fn search(&self, query: &str) -> MetadataResult<Vec<TrackCandidate>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn alternative_query(&self, _track: &Track) -> MetadataResult<Option<String>> {
        self.alternative_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.alternative.lock().unwrap().clone())
    }

    async fn analyze_filename(&self, filename: &str) -> MetadataResult<FileAnalysis> {
        Ok(FileAnalysis::fallback(filename))
    }
}

// ============================================================================
// Harness
// ============================================================================

pub fn test_config() -> EngineConfig {
    EngineConfig {
        sdk_retry_interval: Duration::from_millis(1),
        sdk_max_attempts: 3,
        ..Default::default()
    }
}

pub struct Harness {
    pub engine: PlaybackEngine,
    pub log: CallLog,
    pub audio: Arc<FakeAudio>,
    pub urls: Arc<FakeUrls>,
    pub host: Arc<FakeWidgetHost>,
    pub repository: Arc<SqliteTrackRepository>,
    pub discovery: Arc<ScriptedDiscovery>,
    pub settings: Arc<MemorySettings>,
    pub events: EventBus,
}

impl Harness {
    pub async fn new() -> Self {
        Self::build(test_config(), MemorySettings::default()).await
    }

    pub async fn build(config: EngineConfig, settings: MemorySettings) -> Self {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let audio = Arc::new(FakeAudio::new(log.clone()));
        let urls = Arc::new(FakeUrls::default());
        let host = Arc::new(FakeWidgetHost::new(log.clone(), true));
        let repository = Arc::new(SqliteTrackRepository::new(create_test_pool().await.unwrap()));
        let discovery = Arc::new(ScriptedDiscovery::default());
        let settings = Arc::new(settings);
        let events = EventBus::new(256);

        let engine = PlaybackEngine::new(
            EngineDeps {
                audio_element: audio.clone(),
                object_urls: urls.clone(),
                widget_host: host.clone(),
                repository: repository.clone(),
                discovery: discovery.clone(),
                settings: settings.clone(),
                clock: Arc::new(FixedClock::from_millis(1_000)),
                events: events.clone(),
            },
            config,
        )
        .unwrap();

        Self {
            engine,
            log,
            audio,
            urls,
            host,
            repository,
            discovery,
            settings,
            events,
        }
    }

    pub fn widget(&self) -> &Arc<FakeWidget> {
        &self.host.widget
    }

    /// Stores a local track with a small blob.
    pub async fn local_track(&self, title: &str, duration: f64) -> Track {
        let track = Track::new_local(title, "Artist", format!("{title}.mp3"), duration, 0);
        self.repository
            .put(
                &track,
                Some(AudioBlob::new(vec![1u8; 64], Some("audio/mpeg".into()))),
            )
            .await
            .unwrap();
        track
    }

    pub fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }
}

pub fn remote_track(title: &str, uri: &str) -> Track {
    Track::new_remote(title, "Artist", uri, 0)
}

/// Polls the engine until `predicate` holds, failing after two seconds.
pub async fn wait_until(
    engine: &PlaybackEngine,
    predicate: impl Fn(&PlayerState) -> bool,
) -> PlayerState {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let state = engine.snapshot();
        if predicate(&state) {
            return state;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached; last state: {state:?}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
