//! Domain models for the music library
//!
//! A [`Track`] is the playable unit shared by the store, the discovery
//! service and the playback engine.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Length of a backend-native remote identifier.
pub const REMOTE_IDENTIFIER_LEN: usize = 11;

/// Prefix of synthesized remote track identities.
pub const REMOTE_ID_PREFIX: &str = "remote-";

/// Which playback backend owns a track. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum TrackSource {
    /// Imported audio file, binary kept in the blob store
    Local,
    /// Streamed through the embedded widget
    Remote,
}

impl TrackSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackSource::Local => "local",
            TrackSource::Remote => "remote",
        }
    }
}

impl fmt::Display for TrackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `true` when `uri` is shaped like a backend-native identifier.
pub fn is_remote_identifier(uri: &str) -> bool {
    uri.chars().count() == REMOTE_IDENTIFIER_LEN
}

/// Track record
///
/// For local tracks `uri` is the original filename (display only; the audio
/// is addressed by `id` in the blob store). For remote tracks `uri` is an
/// 11-character identifier, or a free-text query while unresolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// Seconds. Measured at import for local tracks, advisory for remote ones.
    pub duration: f64,
    pub cover_url: String,
    pub source: TrackSource,
    pub uri: String,
    pub genre: Option<String>,
    /// Creation time, Unix milliseconds
    pub added_at: i64,
}

impl Track {
    /// New local track with a random UUID identity.
    pub fn new_local(
        title: impl Into<String>,
        artist: impl Into<String>,
        filename: impl Into<String>,
        duration: f64,
        added_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration,
            cover_url: String::new(),
            source: TrackSource::Local,
            uri: filename.into(),
            genre: None,
            added_at,
        }
    }

    /// New remote track with a fresh [`Track::remote_id`] identity and an
    /// unknown (zero) duration.
    pub fn new_remote(
        title: impl Into<String>,
        artist: impl Into<String>,
        uri: impl Into<String>,
        added_at: i64,
    ) -> Self {
        Self {
            id: Self::remote_id(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration: 0.0,
            cover_url: String::new(),
            source: TrackSource::Remote,
            uri: uri.into(),
            genre: None,
            added_at,
        }
    }

    /// Collision-resistant identity for synthesized remote tracks.
    pub fn remote_id() -> String {
        format!("{}{}", REMOTE_ID_PREFIX, Uuid::new_v4())
    }

    pub fn with_cover_url(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = cover_url.into();
        self
    }

    pub fn with_genre(mut self, genre: Option<String>) -> Self {
        self.genre = genre;
        self
    }

    pub fn with_album(mut self, album: Option<String>) -> Self {
        self.album = album;
        self
    }

    /// A remote track whose `uri` is not an identifier still needs resolving.
    pub fn is_unresolved(&self) -> bool {
        self.source == TrackSource::Remote && !is_remote_identifier(&self.uri)
    }

    /// Validate track data
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Track id cannot be empty".to_string());
        }
        if self.title.trim().is_empty() {
            return Err("Track title cannot be empty".to_string());
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(format!("Invalid track duration: {}", self.duration));
        }
        if self.uri.is_empty() {
            return Err("Track uri cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Binary audio content stored next to a local track.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlob {
    pub data: bytes::Bytes,
    pub mime_type: Option<String>,
}

impl AudioBlob {
    pub fn new(data: impl Into<bytes::Bytes>, mime_type: Option<String>) -> Self {
        Self {
            data: data.into(),
            mime_type,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Bytes used by the store against its quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageEstimate {
    pub used: u64,
    pub quota: u64,
}

/// Library summary shown in the storage panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStatus {
    pub used: u64,
    pub quota: u64,
    pub track_count: u64,
}

impl StorageStatus {
    pub fn from_estimate(estimate: StorageEstimate, track_count: u64) -> Self {
        Self {
            used: estimate.used,
            quota: estimate.quota,
            track_count,
        }
    }

    /// Fraction of the quota in use, `0.0` when the quota is unknown.
    pub fn usage_ratio(&self) -> f64 {
        if self.quota == 0 {
            0.0
        } else {
            self.used as f64 / self.quota as f64
        }
    }
}
