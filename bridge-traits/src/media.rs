//! Host Media Primitives
//!
//! The player drives two host-owned media objects and never touches them
//! directly outside of these traits:
//!
//! - an [`AudioElement`] that decodes binary audio addressed by an ephemeral
//!   object URL minted through an [`ObjectUrlFactory`];
//! - an embedded third-party [`StreamWidget`] created once per session by a
//!   [`StreamWidgetHost`] after the vendor SDK has finished loading.
//!
//! Both report asynchronous state changes through a [`MediaListener`]
//! installed by the core. Hosts push signals; the core never polls for
//! ready/ended/error transitions (only for position).

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::error::Result;

/// Asynchronous notification emitted by a host media object.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSignal {
    /// Metadata is available; `duration` is in seconds.
    Ready { duration: f64 },
    /// Playback actually started or resumed.
    Playing,
    /// Playback paused (by the user, the host or the OS).
    Paused,
    /// The media reached its end.
    Ended,
    /// The media failed. Codes are host specific (the streaming widget uses
    /// 2, 5, 100, 101 and 150).
    Error { code: i32 },
}

/// Receiver for [`MediaSignal`]s, installed by the core on each media object.
pub trait MediaListener: Send + Sync {
    fn on_signal(&self, signal: MediaSignal);
}

/// Host audio element (e.g. `HTMLAudioElement`).
#[async_trait]
pub trait AudioElement: Send + Sync {
    /// Install the listener receiving this element's signals.
    fn attach_listener(&self, listener: Arc<dyn MediaListener>);

    /// Point the element at `url`, or detach its source with `None`.
    fn set_source(&self, url: Option<&str>);

    /// Start playback. Hosts may reject (autoplay policies).
    async fn play(&self) -> Result<()>;

    fn pause(&self);

    fn set_current_time(&self, seconds: f64);

    fn current_time(&self) -> f64;

    /// Duration in seconds, `0.0` while unknown.
    fn duration(&self) -> f64;

    /// Normalised volume in `0.0..=1.0`.
    fn set_volume(&self, volume: f64);
}

/// Mints and releases ephemeral URLs for in-memory blobs
/// (`URL.createObjectURL` / `URL.revokeObjectURL`).
///
/// Every created URL pins its blob until revoked.
pub trait ObjectUrlFactory: Send + Sync {
    fn create_object_url(&self, data: Bytes, mime_type: Option<&str>) -> Result<String>;

    fn revoke_object_url(&self, url: &str);
}

/// Embedded streaming widget addressed by backend-native video identifiers.
pub trait StreamWidget: Send + Sync {
    /// Cue `video_id` and start buffering it.
    fn load_video_by_id(&self, video_id: &str);

    fn play_video(&self);

    fn pause_video(&self);

    fn stop_video(&self);

    fn seek_to(&self, seconds: f64, allow_seek_ahead: bool);

    fn current_time(&self) -> f64;

    fn duration(&self) -> f64;

    /// Volume on the widget's native `0..=100` scale.
    fn set_volume(&self, volume: u8);
}

/// Factory for the session's streaming widget.
///
/// The vendor SDK loads asynchronously; until [`is_sdk_ready`] reports
/// `true` no widget can be created.
///
/// [`is_sdk_ready`]: StreamWidgetHost::is_sdk_ready
#[async_trait]
pub trait StreamWidgetHost: Send + Sync {
    fn is_sdk_ready(&self) -> bool;

    /// Create the widget, wiring `listener` to its state/error callbacks.
    async fn create_widget(
        &self,
        listener: Arc<dyn MediaListener>,
    ) -> Result<Arc<dyn StreamWidget>>;
}
