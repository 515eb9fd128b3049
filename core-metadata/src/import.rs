//! # Local Import Pipeline
//!
//! Turns a user-selected audio file into a stored local track:
//!
//! 1. Ask discovery to analyse the filename (degrades to the filename stem
//!    and `Unknown` artist).
//! 2. Probe the payload for its real duration.
//! 3. Store record and blob in one transaction and publish `TrackImported`.
//!
//! The same service owns the other library mutations (metadata edit,
//! delete, purge) so every change to the store is announced on the bus.

use crate::discovery::{analyze_or_fallback, DiscoveryService};
use crate::error::{MetadataError, Result};
use crate::extractor::{DurationProbe, LoftyDurationProbe};
use bridge_traits::time::{Clock, SystemClock};
use bytes::Bytes;
use core_library::models::{AudioBlob, StorageStatus, Track};
use core_library::{LibraryError, TrackRepository};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct ImportService {
    repository: Arc<dyn TrackRepository>,
    discovery: Arc<dyn DiscoveryService>,
    probe: Arc<dyn DurationProbe>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl ImportService {
    pub fn new(
        repository: Arc<dyn TrackRepository>,
        discovery: Arc<dyn DiscoveryService>,
        events: EventBus,
    ) -> Self {
        Self {
            repository,
            discovery,
            probe: Arc::new(LoftyDurationProbe::new()),
            clock: Arc::new(SystemClock),
            events,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn DurationProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn repository(&self) -> &Arc<dyn TrackRepository> {
        &self.repository
    }

    /// Imports `data` as a new local track.
    ///
    /// `mime_type` is the type reported by the host picker; the probed
    /// container type is used when absent.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty filename or payload, `ProbeFailed` when
    /// the payload is not readable audio, `Library` when the write fails.
    #[instrument(skip(self, data, mime_type), fields(bytes = data.len()))]
    pub async fn import_local_file(
        &self,
        filename: &str,
        data: Bytes,
        mime_type: Option<String>,
    ) -> Result<Track> {
        if filename.trim().is_empty() {
            return Err(MetadataError::InvalidInput("filename is empty".to_string()));
        }
        if data.is_empty() {
            return Err(MetadataError::InvalidInput(format!("{} is empty", filename)));
        }

        let analysis = analyze_or_fallback(self.discovery.as_ref(), filename).await;
        let probed = self.probe.probe(&data)?;

        let track = Track::new_local(
            analysis.title.clone(),
            analysis.artist.clone(),
            filename,
            probed.duration_secs,
            self.clock.unix_timestamp_millis(),
        )
        .with_cover_url(analysis.cover_url())
        .with_genre(analysis.genre);

        let blob = AudioBlob::new(data, mime_type.or(Some(probed.mime_type)));
        self.repository.put(&track, Some(blob)).await?;

        info!(track_id = %track.id, title = %track.title, "Imported local track");
        self.emit(LibraryEvent::TrackImported {
            track_id: track.id.clone(),
            title: track.title.clone(),
        });

        Ok(track)
    }

    /// Writes edited metadata without touching the stored blob.
    ///
    /// The track must already exist and keep its source.
    pub async fn update_track(&self, track: &Track) -> Result<()> {
        let stored = self
            .repository
            .get_by_id(&track.id)
            .await?
            .ok_or_else(|| LibraryError::track_not_found(&track.id))?;

        if stored.source != track.source {
            return Err(MetadataError::InvalidInput(format!(
                "track {} cannot change source from {} to {}",
                track.id, stored.source, track.source
            )));
        }

        self.repository.put(track, None).await?;
        debug!(track_id = %track.id, "Track metadata updated");
        self.emit(LibraryEvent::TrackUpdated {
            track_id: track.id.clone(),
        });
        Ok(())
    }

    /// Removes a track and its blob. Returns `false` if it did not exist.
    pub async fn delete_track(&self, id: &str) -> Result<bool> {
        let removed = self.repository.delete(id).await?;
        if removed {
            info!(track_id = %id, "Track deleted");
            self.emit(LibraryEvent::TrackDeleted {
                track_id: id.to_string(),
            });
        }
        Ok(removed)
    }

    /// Removes every track. Returns the number removed.
    pub async fn purge(&self) -> Result<u64> {
        let removed = self.repository.purge().await?;
        info!(removed, "Library purged");
        self.emit(LibraryEvent::LibraryPurged {
            removed: removed as usize,
        });
        Ok(removed)
    }

    pub async fn status(&self) -> Result<StorageStatus> {
        let estimate = self.repository.estimate_usage().await?;
        let count = self.repository.count().await?;
        Ok(StorageStatus::from_estimate(estimate, count))
    }

    pub async fn list(&self) -> Result<Vec<Track>> {
        Ok(self.repository.get_all().await?)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Track>> {
        Ok(self.repository.get_by_id(id).await?)
    }

    fn emit(&self, event: LibraryEvent) {
        // No subscribers is fine.
        let _ = self.events.emit(CoreEvent::Library(event));
    }
}
