//! # Playback Engine
//!
//! Owns [`PlayerState`] and the single *active backend* pointer, routes
//! transport commands to the backend selected by the current track's
//! source, and folds backend signals into state.
//!
//! ## Request ordering
//!
//! Every `play` takes a ticket. A request whose ticket is no longer the
//! latest when its slow work (resolution, blob fetch, SDK wait) completes is
//! dropped as [`PlayOutcome::Superseded`] without touching state: last
//! caller wins and nothing is queued. Healing results are checked the same
//! way and additionally require the failed track to still be current.
//! A latest request that ends with no candidate settles any `Loading`
//! state left by the request it replaced.
//!
//! ## Mutual exclusion
//!
//! Backend commands run under a transport lock. Before a new track is
//! engaged the previously active backend is stopped, so at most one backend
//! is loaded at any time.
//!
//! ## Lifecycle
//!
//! [`PlaybackEngine::start`] restores the persisted volume and spawns the
//! signal pump and the position poller under one cancellation token;
//! [`PlaybackEngine::shutdown`] stops the active backend and both tasks.

use crate::backends::{LocalBackend, RemoteBackend};
use crate::config::EngineConfig;
use crate::error::{PlaybackError, Result};
use crate::poller::{PositionPoller, PositionSync};
use crate::recovery::{RecoveryCoordinator, Substitution};
use crate::state::{clamp_fraction, clamp_volume, PlayerState, RepeatMode, TransportState};
use crate::traits::{
    signal_channel, BackendEvent, BackendEventReceiver, ErrorDisposition, MediaLocator, Ready,
    SignalForwarder, SourceBackend,
};
use bridge_traits::media::{AudioElement, MediaSignal, ObjectUrlFactory, StreamWidgetHost};
use bridge_traits::storage::SettingsStore;
use bridge_traits::time::Clock;
use core_library::models::{Track, TrackSource};
use core_library::TrackRepository;
use core_metadata::discovery::{first_resolvable, search_or_empty, DiscoveryService};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, Receiver};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

/// Collaborators the engine is built from.
pub struct EngineDeps {
    pub audio_element: Arc<dyn AudioElement>,
    pub object_urls: Arc<dyn ObjectUrlFactory>,
    pub widget_host: Arc<dyn StreamWidgetHost>,
    pub repository: Arc<dyn TrackRepository>,
    pub discovery: Arc<dyn DiscoveryService>,
    pub settings: Arc<dyn SettingsStore>,
    pub clock: Arc<dyn Clock>,
    pub events: EventBus,
}

/// Result of a [`PlaybackEngine::play`] call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The track is loaded and playing.
    Started { track_id: String },
    /// An unresolved remote track found no playable candidate. State is
    /// unchanged.
    ResolutionEmpty,
    /// A later request took over before this one finished.
    Superseded,
}

/// Result of a healing run.
#[derive(Debug, Clone, PartialEq)]
pub enum HealOutcome {
    /// A substitute replaced the failed track and is playing.
    Healed { substitute: Track },
    /// Nothing playable was found; the failed track stays current, stalled.
    Stalled { reason: String },
    /// The user moved on while healing was in flight.
    Superseded,
    /// No remote track is current.
    NothingToHeal,
}

struct Lifecycle {
    cancel: CancellationToken,
    pump: JoinHandle<()>,
    poller: JoinHandle<()>,
}

/// Cheaply cloneable handle to the playback engine.
#[derive(Clone)]
pub struct PlaybackEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    local: Arc<dyn SourceBackend>,
    remote: Arc<dyn SourceBackend>,
    discovery: Arc<dyn DiscoveryService>,
    settings: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    config: EngineConfig,
    recovery: RecoveryCoordinator,
    state: RwLock<PlayerState>,
    active: Mutex<Option<TrackSource>>,
    ticket: AtomicU64,
    transport: tokio::sync::Mutex<()>,
    last_audible_volume: AtomicU8,
    signals: Mutex<Option<BackendEventReceiver>>,
    lifecycle: Mutex<Option<Lifecycle>>,
}

impl PlaybackEngine {
    /// Builds the engine and both backends.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when `config` fails validation.
    pub fn new(deps: EngineDeps, config: EngineConfig) -> Result<Self> {
        config.validate().map_err(PlaybackError::InvalidConfig)?;

        let (sender, receiver) = signal_channel();
        let local = LocalBackend::new(
            deps.audio_element,
            deps.object_urls,
            deps.repository,
            Arc::new(SignalForwarder::new(TrackSource::Local, sender.clone())),
        );
        let remote = RemoteBackend::new(
            deps.widget_host,
            Arc::new(SignalForwarder::new(TrackSource::Remote, sender)),
            &config,
        );

        let recovery = RecoveryCoordinator::new(
            deps.discovery.clone(),
            deps.clock.clone(),
            config.max_heal_attempts,
        );

        let inner = EngineInner {
            local: Arc::new(local),
            remote: Arc::new(remote),
            discovery: deps.discovery,
            settings: deps.settings,
            clock: deps.clock,
            events: deps.events,
            recovery,
            state: RwLock::new(PlayerState::with_volume(config.default_volume)),
            active: Mutex::new(None),
            ticket: AtomicU64::new(0),
            transport: tokio::sync::Mutex::new(()),
            last_audible_volume: AtomicU8::new(config.default_volume.max(1)),
            signals: Mutex::new(Some(receiver)),
            lifecycle: Mutex::new(None),
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Restores the persisted volume and starts the signal pump and the
    /// position poller.
    ///
    /// # Errors
    ///
    /// `AlreadyStarted` on a second call.
    pub async fn start(&self) -> Result<()> {
        let receiver = self
            .inner
            .signals
            .lock()
            .take()
            .ok_or(PlaybackError::AlreadyStarted)?;

        let volume = self.inner.restore_volume().await;

        let cancel = CancellationToken::new();
        let pump = tokio::spawn(run_signal_pump(
            Arc::downgrade(&self.inner),
            receiver,
            cancel.clone(),
        ));

        let target: Arc<dyn PositionSync> = self.inner.clone();
        let poller = PositionPoller::new(self.inner.config.poll_interval)
            .spawn(Arc::downgrade(&target), cancel.clone());

        *self.inner.lifecycle.lock() = Some(Lifecycle {
            cancel,
            pump,
            poller,
        });

        info!(volume, "Playback engine started");
        Ok(())
    }

    /// Stops the active backend and the background tasks. Idempotent.
    pub async fn shutdown(&self) {
        let lifecycle = self.inner.lifecycle.lock().take();
        if let Some(lifecycle) = &lifecycle {
            lifecycle.cancel.cancel();
        }

        self.inner.next_ticket();
        {
            let _transport = self.inner.transport.lock().await;
            self.inner.halt_active();
            self.inner.state.write().is_playing = false;
        }

        if let Some(lifecycle) = lifecycle {
            let _ = lifecycle.pump.await;
            let _ = lifecycle.poller.await;
            info!("Playback engine stopped");
        }
    }

    /// Plays `track`, stopping whatever was active.
    ///
    /// Unresolved remote tracks are resolved through discovery first; if no
    /// candidate carries an identifier the call returns
    /// [`PlayOutcome::ResolutionEmpty`] and nothing changes.
    ///
    /// # Errors
    ///
    /// Backend failures (`BlobNotFound`, `AdapterInitTimeout`, host errors).
    /// The previous current track is kept and the engine is left stalled
    /// with `is_playing = false`.
    pub async fn play(&self, track: Track) -> Result<PlayOutcome> {
        self.inner.play(track).await
    }

    /// Flips between playing and paused.
    ///
    /// No-op without a current track. When nothing is loaded (stalled,
    /// stopped after an error) the current track is played again.
    pub async fn toggle_play(&self) -> Result<()> {
        let (track, playing) = {
            let state = self.inner.state.read();
            (state.current_track.clone(), state.is_playing)
        };
        let Some(track) = track else {
            return Ok(());
        };

        if self.inner.active_backend().is_none() {
            return self.inner.play(track).await.map(|_| ());
        }

        if playing {
            self.pause().await;
            Ok(())
        } else {
            self.resume().await
        }
    }

    /// Pauses the active backend. No-op when idle.
    pub async fn pause(&self) {
        let _transport = self.inner.transport.lock().await;
        let Some(backend) = self.inner.active_backend() else {
            return;
        };
        backend.pause();

        let event = {
            let mut state = self.inner.state.write();
            state.is_playing = false;
            state.transport = TransportState::Paused;
            state.current_track_id().map(|id| PlaybackEvent::Paused {
                track_id: id.to_string(),
                position_secs: state.current_time,
            })
        };
        if let Some(event) = event {
            self.inner.emit(event);
        }
    }

    /// Resumes the active backend. No-op when idle.
    ///
    /// State flips to playing before the backend confirms.
    pub async fn resume(&self) -> Result<()> {
        let _transport = self.inner.transport.lock().await;
        let Some(backend) = self.inner.active_backend() else {
            return Ok(());
        };

        let (track_id, position) = {
            let mut state = self.inner.state.write();
            state.is_playing = true;
            state.transport = TransportState::Playing;
            (
                state.current_track_id().unwrap_or_default().to_string(),
                state.current_time,
            )
        };

        if let Err(e) = backend.play().await {
            warn!(error = %e, %track_id, "Backend refused to resume");
            {
                let mut state = self.inner.state.write();
                state.is_playing = false;
                state.transport = TransportState::Paused;
            }
            self.inner.emit(PlaybackEvent::Error {
                track_id: Some(track_id),
                message: e.to_string(),
                recoverable: e.is_recoverable(),
            });
            return Err(e);
        }

        self.inner.emit(PlaybackEvent::Resumed {
            track_id,
            position_secs: position,
        });
        Ok(())
    }

    /// Stops playback and clears the current track. Cancels in-flight play
    /// requests and healing.
    pub async fn stop(&self) {
        self.inner.next_ticket();
        let _transport = self.inner.transport.lock().await;
        self.inner.halt_active();

        let track_id = {
            let mut state = self.inner.state.write();
            let track_id = state.current_track.take().map(|t| t.id);
            state.is_playing = false;
            state.current_time = 0.0;
            state.duration = 0.0;
            state.transport = TransportState::Idle;
            track_id
        };
        self.inner.emit(PlaybackEvent::Stopped { track_id });
    }

    /// Seeks to `fraction` of the duration and returns the target in
    /// seconds.
    ///
    /// The fraction is clamped to `[0, 1]`, so the target always lies in
    /// `[0, duration]`. `current_time` is set before the backend confirms.
    /// Returns `0.0` and does nothing when idle.
    pub async fn seek(&self, fraction: f64) -> f64 {
        let fraction = clamp_fraction(fraction);
        let _transport = self.inner.transport.lock().await;
        let Some(backend) = self.inner.active_backend() else {
            return 0.0;
        };

        let (target, event) = {
            let mut state = self.inner.state.write();
            let duration = if state.duration.is_finite() {
                state.duration.max(0.0)
            } else {
                0.0
            };
            let target = (fraction * duration).clamp(0.0, duration);
            state.current_time = target;
            let event = state.current_track_id().map(|id| PlaybackEvent::PositionChanged {
                track_id: id.to_string(),
                position_secs: target,
                duration_secs: duration,
            });
            (target, event)
        };

        backend.seek(target);
        if let Some(event) = event {
            self.inner.emit(event);
        }
        target
    }

    /// Clamps `value` into `0..=100`, applies it to both backends and
    /// persists it. Persistence failures are logged, not returned.
    pub async fn set_volume(&self, value: f64) -> u8 {
        self.inner.set_volume(clamp_volume(value)).await
    }

    /// Mutes, or restores the last audible volume (default when none).
    pub async fn toggle_mute(&self) -> u8 {
        let current = self.inner.state.read().volume;
        if current > 0 {
            self.inner
                .last_audible_volume
                .store(current, Ordering::Relaxed);
            self.inner.set_volume(0).await
        } else {
            let restore = match self.inner.last_audible_volume.load(Ordering::Relaxed) {
                0 => self.inner.config.default_volume,
                v => v,
            };
            self.inner.set_volume(restore).await
        }
    }

    /// Off → One → All → Off
    pub fn cycle_repeat_mode(&self) -> RepeatMode {
        let mode = {
            let mut state = self.inner.state.write();
            state.repeat_mode = state.repeat_mode.next();
            state.repeat_mode
        };
        self.inner.emit(PlaybackEvent::RepeatModeChanged {
            mode: mode.as_str().to_string(),
        });
        mode
    }

    pub fn set_repeat_mode(&self, mode: RepeatMode) {
        self.inner.state.write().repeat_mode = mode;
        self.inner.emit(PlaybackEvent::RepeatModeChanged {
            mode: mode.as_str().to_string(),
        });
    }

    /// Flips the stored shuffle flag.
    pub fn toggle_shuffle(&self) -> bool {
        let enabled = {
            let mut state = self.inner.state.write();
            state.shuffle = !state.shuffle;
            state.shuffle
        };
        self.inner.emit(PlaybackEvent::ShuffleChanged { enabled });
        enabled
    }

    /// Replaces the current track's metadata after an edit. Returns `false`
    /// when `track` is not current.
    pub fn refresh_track(&self, track: &Track) -> bool {
        let mut state = self.inner.state.write();
        match state.current_track.as_mut() {
            Some(current) if current.id == track.id && current.source == track.source => {
                *current = track.clone();
                true
            }
            _ => false,
        }
    }

    /// Runs healing for the current remote track as if its backend had
    /// reported a blocked asset.
    pub async fn heal_current(&self) -> HealOutcome {
        let track = self.inner.state.read().current_track.clone();
        match track {
            Some(track) if track.source == TrackSource::Remote => {
                let ticket = self.inner.enter_resolving(track.source);
                self.inner.heal(track, None, ticket).await
            }
            _ => HealOutcome::NothingToHeal,
        }
    }

    /// Pulls the position from the active backend into state. No-op unless
    /// playing.
    pub fn sync_position(&self) -> Option<f64> {
        self.inner.sync_position()
    }

    /// Folds one backend signal into state. Normally driven by the pump
    /// spawned in [`start`](Self::start).
    pub async fn handle_backend_event(&self, event: BackendEvent) {
        self.inner.handle_backend_event(event).await;
    }

    pub fn snapshot(&self) -> PlayerState {
        self.inner.state.read().clone()
    }

    /// Source of the loaded backend, if any.
    pub fn active_source(&self) -> Option<TrackSource> {
        *self.inner.active.lock()
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.inner.events.subscribe()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Healing attempts spent on `track_id`'s lineage.
    pub fn heal_attempts(&self, track_id: &str) -> u32 {
        self.inner.recovery.attempts_for(track_id)
    }
}

impl EngineInner {
    fn backend(&self, source: TrackSource) -> &Arc<dyn SourceBackend> {
        match source {
            TrackSource::Local => &self.local,
            TrackSource::Remote => &self.remote,
        }
    }

    fn active_backend(&self) -> Option<&Arc<dyn SourceBackend>> {
        let active = *self.active.lock();
        active.map(|source| self.backend(source))
    }

    fn next_ticket(&self) -> u64 {
        self.ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.ticket.load(Ordering::SeqCst) == ticket
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine.
        let _ = self.events.emit(CoreEvent::Playback(event));
    }

    /// Stops the active backend and clears the pointer. Caller holds the
    /// transport lock.
    fn halt_active(&self) {
        let previous = self.active.lock().take();
        if let Some(source) = previous {
            debug!(%source, "Stopping active backend");
            self.backend(source).stop();
        }
    }

    #[instrument(skip(self, track), fields(track_id = %track.id, source = %track.source))]
    async fn play(&self, track: Track) -> Result<PlayOutcome> {
        let ticket = self.next_ticket();

        let track = if track.is_unresolved() {
            match self.resolve(&track).await {
                Some(resolved) => resolved,
                None => {
                    info!(query = %track.uri, "No playable candidate; leaving playback unchanged");
                    self.settle_abandoned_load(ticket).await;
                    return Ok(PlayOutcome::ResolutionEmpty);
                }
            }
        } else {
            track
        };

        self.start_track(track, ticket).await
    }

    /// Settles a `Loading` state left behind by an earlier request that this
    /// one superseded. No-op unless `ticket` is still the latest.
    async fn settle_abandoned_load(&self, ticket: u64) {
        let _transport = self.transport.lock().await;
        if !self.is_current(ticket) || self.active.lock().is_some() {
            return;
        }
        let mut state = self.state.write();
        if state.transport != TransportState::Loading {
            return;
        }
        state.is_playing = false;
        state.transport = if state.current_track.is_some() {
            TransportState::Stalled
        } else {
            TransportState::Idle
        };
        debug!(transport = ?state.transport, "Settled abandoned load");
    }

    /// First candidate with an identifier, as a fresh remote track.
    async fn resolve(&self, track: &Track) -> Option<Track> {
        let candidates = search_or_empty(self.discovery.as_ref(), &track.uri).await;
        let candidate = first_resolvable(&candidates)?;
        let resolved = candidate.to_remote_track(self.clock.unix_timestamp_millis());
        debug!(resolved_id = %resolved.id, uri = %resolved.uri, "Resolved remote query");
        Some(resolved)
    }

    async fn start_track(&self, track: Track, ticket: u64) -> Result<PlayOutcome> {
        {
            let _transport = self.transport.lock().await;
            if !self.is_current(ticket) {
                return Ok(PlayOutcome::Superseded);
            }
            self.halt_active();
            let mut state = self.state.write();
            state.is_playing = false;
            state.transport = TransportState::Loading;
        }

        let backend = self.backend(track.source).clone();
        let prepared = backend.prepare(&track).await;

        let _transport = self.transport.lock().await;
        if !self.is_current(ticket) {
            debug!(track_id = %track.id, "Play request superseded");
            return Ok(PlayOutcome::Superseded);
        }

        let engaged = match prepared {
            Ok(locator) => self.engage(&backend, locator).await,
            Err(e) => Err(e),
        };

        match engaged {
            Ok(ready) => {
                let track_id = track.id.clone();
                self.commit(track, ready);
                Ok(PlayOutcome::Started { track_id })
            }
            Err(e) => {
                backend.stop();
                Err(self.fail(&track, e))
            }
        }
    }

    async fn engage(&self, backend: &Arc<dyn SourceBackend>, locator: MediaLocator) -> Result<Ready> {
        let ready = backend.load(locator).await?;
        *self.active.lock() = Some(backend.kind());
        let volume = self.state.read().volume;
        backend.set_volume(volume);
        backend.play().await?;
        Ok(ready)
    }

    fn commit(&self, track: Track, ready: Ready) {
        let event = PlaybackEvent::TrackStarted {
            track_id: track.id.clone(),
            title: track.title.clone(),
            source: track.source.as_str().to_string(),
        };
        info!(track_id = %track.id, source = %track.source, "Track started");

        {
            let mut state = self.state.write();
            state.duration = ready.duration.unwrap_or(track.duration);
            state.current_track = Some(track);
            state.is_playing = true;
            state.current_time = 0.0;
            state.transport = TransportState::Playing;
        }
        self.emit(event);
    }

    /// Leaves the engine stalled after a failed play, keeping the previous
    /// current track.
    fn fail(&self, track: &Track, error: PlaybackError) -> PlaybackError {
        warn!(track_id = %track.id, error = %error, "Play failed");
        *self.active.lock() = None;
        {
            let mut state = self.state.write();
            state.is_playing = false;
            state.transport = if state.current_track.is_some() {
                TransportState::Stalled
            } else {
                TransportState::Idle
            };
        }
        self.emit(PlaybackEvent::Error {
            track_id: Some(track.id.clone()),
            message: error.to_string(),
            recoverable: error.is_recoverable(),
        });
        error
    }

    async fn handle_backend_event(self: &Arc<Self>, event: BackendEvent) {
        let active = *self.active.lock();
        if active != Some(event.source) {
            trace!(source = %event.source, signal = ?event.signal, "Dropping signal from inactive backend");
            return;
        }

        match event.signal {
            MediaSignal::Ready { duration } => {
                if !duration.is_finite() || duration <= 0.0 {
                    return;
                }
                let track_id = {
                    let mut state = self.state.write();
                    state.duration = duration;
                    state.current_track_id().map(str::to_string)
                };
                if let Some(track_id) = track_id {
                    self.emit(PlaybackEvent::DurationChanged {
                        track_id,
                        duration_secs: duration,
                    });
                }
            }
            MediaSignal::Playing => {
                let mut state = self.state.write();
                state.is_playing = true;
                state.transport = TransportState::Playing;
            }
            MediaSignal::Paused => {
                let mut state = self.state.write();
                state.is_playing = false;
                if state.transport == TransportState::Playing {
                    state.transport = TransportState::Paused;
                }
            }
            MediaSignal::Ended => self.on_ended().await,
            MediaSignal::Error { code } => self.on_backend_error(event.source, code),
        }
    }

    async fn on_ended(&self) {
        let (track, repeat_mode) = {
            let state = self.state.read();
            (state.current_track.clone(), state.repeat_mode)
        };
        let Some(track) = track else {
            return;
        };

        self.emit(PlaybackEvent::Ended {
            track_id: track.id.clone(),
        });

        if repeat_mode == RepeatMode::One {
            debug!(track_id = %track.id, "Repeating track");
            if let Err(e) = self.play(track).await {
                warn!(error = %e, "Repeat failed");
            }
            return;
        }

        let mut state = self.state.write();
        state.is_playing = false;
        state.current_time = state.duration;
        state.transport = TransportState::Paused;
    }

    fn on_backend_error(self: &Arc<Self>, source: TrackSource, code: i32) {
        let Some(track) = self.state.read().current_track.clone() else {
            return;
        };

        match self.backend(source).classify_error(code) {
            ErrorDisposition::Heal => {
                warn!(track_id = %track.id, code, "Remote asset blocked; healing");
                let ticket = self.enter_resolving(source);
                let engine = Arc::clone(self);
                tokio::spawn(async move {
                    engine.heal(track, Some(code), ticket).await;
                });
            }
            ErrorDisposition::Fatal => {
                let error = PlaybackError::MediaFailed {
                    track_id: track.id.clone(),
                    code,
                };
                warn!(%source, code, "Fatal media error");
                self.backend(source).stop();
                *self.active.lock() = None;
                {
                    let mut state = self.state.write();
                    state.is_playing = false;
                    state.transport = TransportState::Stalled;
                }
                self.emit(PlaybackEvent::Error {
                    track_id: Some(track.id.clone()),
                    message: error.to_string(),
                    recoverable: false,
                });
                self.emit(PlaybackEvent::Stalled {
                    track_id: Some(track.id),
                    reason: error.to_string(),
                });
            }
        }
    }

    /// Stops the failing backend and marks the engine as resolving.
    /// Returns the ticket healing results are validated against.
    fn enter_resolving(&self, source: TrackSource) -> u64 {
        {
            let mut active = self.active.lock();
            if *active == Some(source) {
                self.backend(source).stop();
                *active = None;
            }
        }
        let mut state = self.state.write();
        state.is_playing = false;
        state.transport = TransportState::Resolving;
        self.ticket.load(Ordering::SeqCst)
    }

    fn still_current(&self, ticket: u64, track_id: &str) -> bool {
        self.is_current(ticket) && self.state.read().current_track_id() == Some(track_id)
    }

    #[instrument(skip(self, failed), fields(track_id = %failed.id))]
    async fn heal(&self, failed: Track, code: Option<i32>, ticket: u64) -> HealOutcome {
        let Some(attempt) = self.recovery.begin_attempt(&failed) else {
            return self.stall(&failed, ticket, "healing attempts exhausted".to_string());
        };

        self.emit(PlaybackEvent::HealingStarted {
            track_id: failed.id.clone(),
            attempt,
        });

        let substitution = self.recovery.find_substitute(&failed).await;
        if !self.still_current(ticket, &failed.id) {
            info!("Discarding healing result for a track that is no longer current");
            return HealOutcome::Superseded;
        }

        match substitution {
            Substitution::Found(substitute) => match self.play(substitute.clone()).await {
                Ok(PlayOutcome::Started { track_id }) => {
                    let started = self
                        .state
                        .read()
                        .current_track
                        .clone()
                        .filter(|t| t.id == track_id)
                        .unwrap_or(substitute);
                    self.recovery.adopt(&started.id, &failed);
                    self.emit(PlaybackEvent::Healed {
                        failed_track_id: failed.id.clone(),
                        substitute_track_id: track_id,
                    });
                    HealOutcome::Healed { substitute: started }
                }
                Ok(PlayOutcome::Superseded) => HealOutcome::Superseded,
                Ok(PlayOutcome::ResolutionEmpty) => {
                    let reason = PlaybackError::ResolutionEmpty(substitute.uri).to_string();
                    self.stall(&failed, self.ticket.load(Ordering::SeqCst), reason)
                }
                Err(e) => self.stall(&failed, self.ticket.load(Ordering::SeqCst), e.to_string()),
            },
            Substitution::NoAlternative => {
                let reason = PlaybackError::RemotePlaybackBlocked {
                    track_id: failed.id.clone(),
                    code: code.unwrap_or_default(),
                }
                .to_string();
                self.stall(&failed, ticket, reason)
            }
            Substitution::NoCandidates { query } => {
                let reason = PlaybackError::ResolutionEmpty(query).to_string();
                self.stall(&failed, ticket, reason)
            }
        }
    }

    /// Parks the engine on the failed track with `is_playing = false`.
    fn stall(&self, failed: &Track, ticket: u64, reason: String) -> HealOutcome {
        if !self.still_current(ticket, &failed.id) {
            return HealOutcome::Superseded;
        }

        warn!(track_id = %failed.id, %reason, "Playback stalled");
        {
            let mut state = self.state.write();
            state.is_playing = false;
            state.transport = TransportState::Stalled;
        }
        self.emit(PlaybackEvent::Stalled {
            track_id: Some(failed.id.clone()),
            reason: reason.clone(),
        });
        HealOutcome::Stalled { reason }
    }

    async fn set_volume(&self, volume: u8) -> u8 {
        self.apply_volume(volume);
        self.emit(PlaybackEvent::VolumeChanged { volume });

        if let Err(e) = self
            .settings
            .set_i64(&self.config.volume_key, i64::from(volume))
            .await
        {
            warn!(error = %e, "Failed to persist volume");
        }
        volume
    }

    fn apply_volume(&self, volume: u8) {
        self.local.set_volume(volume);
        self.remote.set_volume(volume);
        self.state.write().volume = volume;
        if volume > 0 {
            self.last_audible_volume.store(volume, Ordering::Relaxed);
        }
    }

    async fn restore_volume(&self) -> u8 {
        let stored = match self.settings.get_i64(&self.config.volume_key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted volume");
                None
            }
        };
        let volume = stored
            .map(|v| clamp_volume(v as f64))
            .unwrap_or(self.config.default_volume);
        self.apply_volume(volume);
        volume
    }
}

impl PositionSync for EngineInner {
    fn sync_position(&self) -> Option<f64> {
        if !self.state.read().is_playing {
            return None;
        }
        let backend = self.active_backend()?;
        let position = backend.position();
        let backend_duration = backend.duration();
        if !position.is_finite() {
            return None;
        }

        let event = {
            let mut state = self.state.write();
            state.current_time = position.max(0.0);
            if state.duration <= 0.0 && backend_duration.is_finite() && backend_duration > 0.0 {
                state.duration = backend_duration;
            }
            state.current_track_id().map(|id| PlaybackEvent::PositionChanged {
                track_id: id.to_string(),
                position_secs: state.current_time,
                duration_secs: state.duration,
            })
        };
        if let Some(event) = event {
            self.emit(event);
        }
        Some(position.max(0.0))
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        if let Some(lifecycle) = self.lifecycle.get_mut().take() {
            lifecycle.cancel.cancel();
        }
    }
}

async fn run_signal_pump(
    engine: Weak<EngineInner>,
    mut signals: BackendEventReceiver,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = signals.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        let Some(engine) = engine.upgrade() else {
            break;
        };
        engine.handle_backend_event(event).await;
    }
    debug!("Signal pump stopped");
}
