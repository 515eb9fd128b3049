//! Discovery & Resolution Contract
//!
//! The discovery service turns free text into playable candidates, proposes
//! alternative queries for blocked remote tracks, and guesses metadata from
//! filenames.
//!
//! Every call is fallible. Callers that must not surface collaborator
//! failures use the degrading helpers ([`search_or_empty`],
//! [`alternative_or_none`], [`analyze_or_fallback`]) which log and substitute
//! an empty or default result.

use async_trait::async_trait;
use core_library::models::{is_remote_identifier, Track};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Base URL for generated cover images.
pub const COVER_BASE_URL: &str = "https://picsum.photos/seed";

/// Seed used when nothing better is known.
pub const FALLBACK_COVER_SEED: &str = "music";

/// Artist shown when a filename gives no hint.
pub const UNKNOWN_ARTIST: &str = "Unknown";

/// Square cover image URL for `seed`.
pub fn cover_url_for_seed(seed: &str) -> String {
    format!("{}/{}/600/600", COVER_BASE_URL, urlencoding::encode(seed))
}

/// A track suggested by discovery.
///
/// `uri` is either an 11-character remote identifier or a further free-text
/// query that still needs resolving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackCandidate {
    pub title: String,
    pub artist: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}

impl TrackCandidate {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            uri: uri.into(),
            genre: None,
            mood: None,
        }
    }

    /// `true` when `uri` is a backend-native identifier.
    pub fn has_identifier(&self) -> bool {
        is_remote_identifier(&self.uri)
    }

    /// Remote track with a fresh identity, unknown duration and a cover
    /// seeded by the title.
    pub fn to_remote_track(&self, added_at: i64) -> Track {
        Track::new_remote(&self.title, &self.artist, &self.uri, added_at)
            .with_cover_url(cover_url_for_seed(&self.title))
            .with_genre(self.genre.clone())
    }
}

/// First candidate carrying a backend-native identifier.
pub fn first_resolvable(candidates: &[TrackCandidate]) -> Option<&TrackCandidate> {
    candidates.iter().find(|c| c.has_identifier())
}

/// Metadata guessed from a filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub title: String,
    pub artist: String,
    pub genre: Option<String>,
    pub cover_seed: Option<String>,
}

impl FileAnalysis {
    /// Default analysis: title is the filename up to its first `.`.
    pub fn fallback(filename: &str) -> Self {
        let stem = filename.split('.').next().unwrap_or_default().trim();
        let title = if stem.is_empty() { filename } else { stem };

        Self {
            title: title.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            genre: None,
            cover_seed: Some(FALLBACK_COVER_SEED.to_string()),
        }
    }

    /// Cover URL from the seed, or a random seed when none was suggested.
    pub fn cover_url(&self) -> String {
        match &self.cover_seed {
            Some(seed) => cover_url_for_seed(seed),
            None => cover_url_for_seed(&uuid::Uuid::new_v4().simple().to_string()),
        }
    }
}

/// Semantic discovery collaborator.
#[async_trait]
pub trait DiscoveryService: Send + Sync {
    /// Ordered candidates for a mood or free-text query.
    async fn search(&self, query: &str) -> Result<Vec<TrackCandidate>>;

    /// Alternative free-text query for a blocked or dead remote track.
    async fn alternative_query(&self, track: &Track) -> Result<Option<String>>;

    /// Title/artist/genre/cover seed guessed from `filename`.
    async fn analyze_filename(&self, filename: &str) -> Result<FileAnalysis>;
}

/// [`DiscoveryService::search`], degraded to an empty list on failure.
pub async fn search_or_empty(service: &dyn DiscoveryService, query: &str) -> Vec<TrackCandidate> {
    match service.search(query).await {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(error = %e, query, "Discovery search failed");
            Vec::new()
        }
    }
}

/// [`DiscoveryService::alternative_query`], degraded to `None` on failure.
pub async fn alternative_or_none(service: &dyn DiscoveryService, track: &Track) -> Option<String> {
    match service.alternative_query(track).await {
        Ok(Some(query)) if !query.trim().is_empty() => Some(query),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, track_id = %track.id, "Alternative query failed");
            None
        }
    }
}

/// [`DiscoveryService::analyze_filename`], degraded to
/// [`FileAnalysis::fallback`] on failure or blank fields.
pub async fn analyze_or_fallback(service: &dyn DiscoveryService, filename: &str) -> FileAnalysis {
    let fallback = FileAnalysis::fallback(filename);

    match service.analyze_filename(filename).await {
        Ok(analysis) => FileAnalysis {
            title: non_blank(analysis.title).unwrap_or_else(|| filename.to_string()),
            artist: non_blank(analysis.artist).unwrap_or(fallback.artist),
            genre: analysis.genre.and_then(non_blank),
            cover_seed: analysis.cover_seed.and_then(non_blank),
        },
        Err(e) => {
            warn!(error = %e, filename, "Filename analysis failed");
            fallback
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Discovery stand-in used when no service is configured.
///
/// Searches find nothing, no alternatives are offered and filenames get the
/// fallback analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineDiscovery;

#[async_trait]
impl DiscoveryService for OfflineDiscovery {
    async fn search(&self, _query: &str) -> Result<Vec<TrackCandidate>> {
        Ok(Vec::new())
    }

    async fn alternative_query(&self, _track: &Track) -> Result<Option<String>> {
        Ok(None)
    }

    async fn analyze_filename(&self, filename: &str) -> Result<FileAnalysis> {
        Ok(FileAnalysis::fallback(filename))
    }
}
