//! Local backend: imported audio played through the host audio element.
//!
//! Blobs are handed to the element as ephemeral object URLs. At most one URL
//! is live; it is revoked before the next one is minted and when the backend
//! stops.

use crate::error::{PlaybackError, Result};
use crate::traits::{ErrorDisposition, MediaLocator, Ready, SourceBackend};
use async_trait::async_trait;
use bridge_traits::media::{AudioElement, MediaListener, ObjectUrlFactory};
use core_library::models::{Track, TrackSource};
use core_library::TrackRepository;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct LocalBackend {
    element: Arc<dyn AudioElement>,
    urls: Arc<dyn ObjectUrlFactory>,
    repository: Arc<dyn TrackRepository>,
    live_url: Mutex<Option<String>>,
    volume: AtomicU8,
}

impl LocalBackend {
    /// Creates the backend and installs `listener` on the audio element.
    pub fn new(
        element: Arc<dyn AudioElement>,
        urls: Arc<dyn ObjectUrlFactory>,
        repository: Arc<dyn TrackRepository>,
        listener: Arc<dyn MediaListener>,
    ) -> Self {
        element.attach_listener(listener);
        Self {
            element,
            urls,
            repository,
            live_url: Mutex::new(None),
            volume: AtomicU8::new(100),
        }
    }

    fn release_url(&self) {
        let released = self.live_url.lock().take();
        if let Some(url) = released {
            self.element.set_source(None);
            self.urls.revoke_object_url(&url);
            debug!(%url, "Released object URL");
        }
    }
}

#[async_trait]
impl SourceBackend for LocalBackend {
    fn kind(&self) -> TrackSource {
        TrackSource::Local
    }

    #[instrument(skip(self, track), fields(track_id = %track.id))]
    async fn prepare(&self, track: &Track) -> Result<MediaLocator> {
        let blob = self
            .repository
            .get_blob(&track.id)
            .await?
            .ok_or_else(|| PlaybackError::BlobNotFound(track.id.clone()))?;

        Ok(MediaLocator::Blob {
            track_id: track.id.clone(),
            blob,
            duration: track.duration,
        })
    }

    async fn load(&self, locator: MediaLocator) -> Result<Ready> {
        let (track_id, blob, duration) = match locator {
            MediaLocator::Blob {
                track_id,
                blob,
                duration,
            } => (track_id, blob, duration),
            MediaLocator::Identifier(id) => {
                return Err(PlaybackError::InvalidLocator(format!(
                    "local backend cannot load identifier {}",
                    id
                )))
            }
        };

        self.release_url();

        let url = self
            .urls
            .create_object_url(blob.data, blob.mime_type.as_deref())?;
        self.element.set_source(Some(&url));
        self.element
            .set_volume(f64::from(self.volume.load(Ordering::Relaxed)) / 100.0);
        *self.live_url.lock() = Some(url);

        debug!(%track_id, duration, "Local media loaded");
        Ok(Ready {
            duration: Some(if duration.is_finite() { duration.max(0.0) } else { 0.0 }),
        })
    }

    async fn play(&self) -> Result<()> {
        if !self.is_loaded() {
            return Ok(());
        }
        self.element.play().await?;
        Ok(())
    }

    fn pause(&self) {
        if self.is_loaded() {
            self.element.pause();
        }
    }

    fn stop(&self) {
        if self.is_loaded() {
            self.element.pause();
            self.element.set_current_time(0.0);
            self.release_url();
        }
    }

    fn seek(&self, seconds: f64) {
        if !self.is_loaded() {
            return;
        }
        let duration = self.element.duration();
        let upper = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        };
        self.element.set_current_time(seconds.clamp(0.0, upper));
    }

    fn position(&self) -> f64 {
        if self.is_loaded() {
            self.element.current_time()
        } else {
            0.0
        }
    }

    fn duration(&self) -> f64 {
        if self.is_loaded() {
            self.element.duration()
        } else {
            0.0
        }
    }

    fn set_volume(&self, volume: u8) {
        let volume = volume.min(100);
        self.volume.store(volume, Ordering::Relaxed);
        self.element.set_volume(f64::from(volume) / 100.0);
    }

    fn is_loaded(&self) -> bool {
        self.live_url.lock().is_some()
    }

    fn classify_error(&self, _code: i32) -> ErrorDisposition {
        ErrorDisposition::Fatal
    }
}

impl Drop for LocalBackend {
    fn drop(&mut self) {
        if let Some(url) = self.live_url.get_mut().take() {
            self.urls.revoke_object_url(&url);
        }
    }
}
