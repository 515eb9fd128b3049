//! Core service façade and bootstrap helpers.
//!
//! This crate turns a [`CoreConfig`](core_runtime::config::CoreConfig) of
//! host-provided capabilities (media primitives, settings, HTTP) into a
//! running [`PlayerSession`]. Desktop hosts typically enable the
//! `desktop-shims` feature so the settings store and HTTP client default to
//! the `bridge-desktop` implementations; `gemini` enables the hosted
//! discovery provider.

pub mod error;
pub mod session;

pub use error::{CoreError, Result};
pub use session::{PlayerSession, PlayerSessionBuilder};

pub use core_library::models::{StorageStatus, Track, TrackSource};
pub use core_metadata::discovery::TrackCandidate;
pub use core_playback::{
    format_time, EngineConfig, HealOutcome, PlayOutcome, PlaybackEngine, PlayerState, RepeatMode,
    TransportState,
};
pub use core_runtime::config::{CoreConfig, CoreConfigBuilder};
