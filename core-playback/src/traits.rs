//! # Source Backend Contract
//!
//! Every playback source (imported blobs, remote stream) is driven through
//! one capability interface, [`SourceBackend`]. The engine selects a backend
//! by [`TrackSource`] once per operation and never branches on the source
//! tag otherwise.
//!
//! ## Two-phase loading
//!
//! Loading is split so the engine can drop superseded requests without
//! leaking resources:
//!
//! - [`prepare`](SourceBackend::prepare) does the slow, side-effect free work
//!   (blob fetch, SDK readiness wait) and returns a [`MediaLocator`];
//! - [`load`](SourceBackend::load) engages the host media object. The engine
//!   only calls it for the most recent play request.
//!
//! ## Signals
//!
//! Backends push [`MediaSignal`]s from their host objects through a
//! [`SignalForwarder`], which tags each one with its source and hands it to
//! the engine's signal pump as a [`BackendEvent`].

use crate::error::Result;
use async_trait::async_trait;
use bridge_traits::media::{MediaListener, MediaSignal};
use core_library::models::{AudioBlob, Track, TrackSource};
use tokio::sync::mpsc;
use tracing::trace;

/// What a backend needs to engage a track, produced by `prepare`.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaLocator {
    /// Local audio content with its measured duration (seconds).
    Blob {
        track_id: String,
        blob: AudioBlob,
        duration: f64,
    },
    /// Backend-native remote identifier.
    Identifier(String),
}

/// Outcome of a successful `load`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ready {
    /// Known duration in seconds. `None` when the backend only learns it
    /// later through a `Ready` signal.
    pub duration: Option<f64>,
}

/// How the engine should react to a backend error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// The asset is blocked; look for a substitute.
    Heal,
    /// Stop and report.
    Fatal,
}

/// Playback driver for one source kind.
///
/// Transport calls on a backend with nothing loaded are no-ops.
#[async_trait]
pub trait SourceBackend: Send + Sync {
    fn kind(&self) -> TrackSource;

    /// Slow, side-effect free preparation of `track`.
    ///
    /// # Errors
    ///
    /// - `BlobNotFound` when a local track has no stored audio
    /// - `InvalidLocator` when a remote track has no identifier
    /// - `AdapterInitTimeout` when the streaming SDK never became ready
    async fn prepare(&self, track: &Track) -> Result<MediaLocator>;

    /// Engage the host media object with `locator`, replacing whatever was
    /// loaded.
    async fn load(&self, locator: MediaLocator) -> Result<Ready>;

    async fn play(&self) -> Result<()>;

    fn pause(&self);

    /// Stop transport and release the loaded media.
    fn stop(&self);

    /// Absolute seek, clamped to `[0, duration]`.
    fn seek(&self, seconds: f64);

    fn position(&self) -> f64;

    /// `0.0` while unknown.
    fn duration(&self) -> f64;

    /// Volume on the `0..=100` scale. Remembered when nothing is loaded.
    fn set_volume(&self, volume: u8);

    fn is_loaded(&self) -> bool;

    fn classify_error(&self, code: i32) -> ErrorDisposition;
}

/// A [`MediaSignal`] tagged with the backend that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendEvent {
    pub source: TrackSource,
    pub signal: MediaSignal,
}

/// Receiving half of the signal channel, owned by the engine's pump.
pub type BackendEventReceiver = mpsc::UnboundedReceiver<BackendEvent>;

/// New signal channel.
pub fn signal_channel() -> (mpsc::UnboundedSender<BackendEvent>, BackendEventReceiver) {
    mpsc::unbounded_channel()
}

/// [`MediaListener`] installed on host media objects.
///
/// Host callbacks are synchronous, so signals are queued and never block
/// the host.
#[derive(Debug, Clone)]
pub struct SignalForwarder {
    source: TrackSource,
    sender: mpsc::UnboundedSender<BackendEvent>,
}

impl SignalForwarder {
    pub fn new(source: TrackSource, sender: mpsc::UnboundedSender<BackendEvent>) -> Self {
        Self { source, sender }
    }
}

impl MediaListener for SignalForwarder {
    fn on_signal(&self, signal: MediaSignal) {
        trace!(source = %self.source, ?signal, "Backend signal");
        // Closed after engine shutdown.
        let _ = self.sender.send(BackendEvent {
            source: self.source,
            signal,
        });
    }
}
