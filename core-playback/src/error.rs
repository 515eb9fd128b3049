//! # Playback Error Types
//!
//! Failures of the playback engine and its source backends.

use bridge_traits::error::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// A local track's audio blob is missing from the store.
    #[error("Audio blob not found for track {0}")]
    BlobNotFound(String),

    /// A backend was handed a locator it cannot play (free-text query on
    /// the remote backend, identifier on the local one).
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    // ========================================================================
    // Remote Backend Errors
    // ========================================================================
    /// The streaming SDK never became ready.
    #[error("Streaming widget not ready after {attempts} attempts")]
    AdapterInitTimeout { attempts: u32 },

    /// The remote asset is blocked or restricted.
    #[error("Remote playback blocked for track {track_id} (code {code})")]
    RemotePlaybackBlocked { track_id: String, code: i32 },

    /// Fatal media error reported by a backend.
    #[error("Media error {code} on track {track_id}")]
    MediaFailed { track_id: String, code: i32 },

    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// Resolver or discovery produced nothing playable.
    #[error("No playable candidate for {0}")]
    ResolutionEmpty(String),

    /// A collaborator returned data that failed validation.
    #[error("Malformed service response: {0}")]
    MalformedServiceResponse(String),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    #[error("Playback engine already started")]
    AlreadyStarted,

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    /// Track store failure.
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    /// Host capability failure (audio element, settings store).
    #[error("Host error: {0}")]
    Bridge(#[from] BridgeError),
}

impl PlaybackError {
    /// Returns `true` if this error maps to a degraded local state (stall,
    /// heal, empty result) rather than a failure the UI must show.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlaybackError::AdapterInitTimeout { .. }
                | PlaybackError::RemotePlaybackBlocked { .. }
                | PlaybackError::ResolutionEmpty(_)
                | PlaybackError::MalformedServiceResponse(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_classification() {
        assert!(PlaybackError::ResolutionEmpty("lofi".into()).is_recoverable());
        assert!(PlaybackError::AdapterInitTimeout { attempts: 50 }.is_recoverable());
        assert!(PlaybackError::RemotePlaybackBlocked {
            track_id: "t".into(),
            code: 150
        }
        .is_recoverable());

        assert!(!PlaybackError::BlobNotFound("t".into()).is_recoverable());
        assert!(!PlaybackError::Library(LibraryError::track_not_found("t")).is_recoverable());
    }
}
