//! Remote backend: the embedded streaming widget.
//!
//! The widget is created lazily, once per session, after the vendor SDK
//! reports readiness. Readiness is polled at a fixed interval for a bounded
//! number of attempts; past that every prepare fails with
//! `AdapterInitTimeout` until the SDK shows up.

use crate::config::EngineConfig;
use crate::error::{PlaybackError, Result};
use crate::traits::{ErrorDisposition, MediaLocator, Ready, SourceBackend};
use async_trait::async_trait;
use bridge_traits::media::{MediaListener, StreamWidget, StreamWidgetHost};
use core_library::models::{is_remote_identifier, Track, TrackSource};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub struct RemoteBackend {
    host: Arc<dyn StreamWidgetHost>,
    listener: Arc<dyn MediaListener>,
    widget: OnceCell<Arc<dyn StreamWidget>>,
    loaded: AtomicBool,
    volume: AtomicU8,
    retry_interval: Duration,
    max_attempts: u32,
    blocked_codes: Vec<i32>,
}

impl RemoteBackend {
    pub fn new(
        host: Arc<dyn StreamWidgetHost>,
        listener: Arc<dyn MediaListener>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            host,
            listener,
            widget: OnceCell::new(),
            loaded: AtomicBool::new(false),
            volume: AtomicU8::new(100),
            retry_interval: config.sdk_retry_interval,
            max_attempts: config.sdk_max_attempts.max(1),
            blocked_codes: config.blocked_error_codes.clone(),
        }
    }

    /// Creates the widget on first use.
    pub async fn ensure_widget(&self) -> Result<Arc<dyn StreamWidget>> {
        let widget = self
            .widget
            .get_or_try_init(|| async {
                self.wait_for_sdk().await?;
                let widget = self.host.create_widget(self.listener.clone()).await?;
                widget.set_volume(self.volume.load(Ordering::Relaxed));
                info!("Streaming widget created");
                Ok::<_, PlaybackError>(widget)
            })
            .await?;
        Ok(widget.clone())
    }

    async fn wait_for_sdk(&self) -> Result<()> {
        for attempt in 1..=self.max_attempts {
            if self.host.is_sdk_ready() {
                debug!(attempt, "Streaming SDK ready");
                return Ok(());
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.retry_interval).await;
            }
        }

        warn!(attempts = self.max_attempts, "Streaming SDK never became ready");
        Err(PlaybackError::AdapterInitTimeout {
            attempts: self.max_attempts,
        })
    }

    fn loaded_widget(&self) -> Option<&Arc<dyn StreamWidget>> {
        if self.loaded.load(Ordering::Acquire) {
            self.widget.get()
        } else {
            None
        }
    }
}

#[async_trait]
impl SourceBackend for RemoteBackend {
    fn kind(&self) -> TrackSource {
        TrackSource::Remote
    }

    async fn prepare(&self, track: &Track) -> Result<MediaLocator> {
        if !is_remote_identifier(&track.uri) {
            return Err(PlaybackError::InvalidLocator(format!(
                "{:?} is not a remote identifier",
                track.uri
            )));
        }
        self.ensure_widget().await?;
        Ok(MediaLocator::Identifier(track.uri.clone()))
    }

    async fn load(&self, locator: MediaLocator) -> Result<Ready> {
        let video_id = match locator {
            MediaLocator::Identifier(id) => id,
            MediaLocator::Blob { track_id, .. } => {
                return Err(PlaybackError::InvalidLocator(format!(
                    "remote backend cannot load blob of track {}",
                    track_id
                )))
            }
        };

        let widget = self.ensure_widget().await?;
        widget.load_video_by_id(&video_id);
        self.loaded.store(true, Ordering::Release);

        debug!(%video_id, "Remote media cued");
        Ok(Ready { duration: None })
    }

    async fn play(&self) -> Result<()> {
        if let Some(widget) = self.loaded_widget() {
            widget.play_video();
        }
        Ok(())
    }

    fn pause(&self) {
        if let Some(widget) = self.loaded_widget() {
            widget.pause_video();
        }
    }

    fn stop(&self) {
        if let Some(widget) = self.loaded_widget() {
            widget.stop_video();
        }
        self.loaded.store(false, Ordering::Release);
    }

    fn seek(&self, seconds: f64) {
        if let Some(widget) = self.loaded_widget() {
            let duration = widget.duration();
            let upper = if duration.is_finite() && duration > 0.0 {
                duration
            } else {
                0.0
            };
            widget.seek_to(seconds.clamp(0.0, upper), true);
        }
    }

    fn position(&self) -> f64 {
        self.loaded_widget().map_or(0.0, |w| w.current_time())
    }

    fn duration(&self) -> f64 {
        self.loaded_widget().map_or(0.0, |w| w.duration())
    }

    fn set_volume(&self, volume: u8) {
        let volume = volume.min(100);
        self.volume.store(volume, Ordering::Relaxed);
        if let Some(widget) = self.widget.get() {
            widget.set_volume(volume);
        }
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    fn classify_error(&self, code: i32) -> ErrorDisposition {
        if self.blocked_codes.contains(&code) {
            ErrorDisposition::Heal
        } else {
            ErrorDisposition::Fatal
        }
    }
}
