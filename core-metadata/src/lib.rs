//! # Discovery & Import Module
//!
//! Everything that produces tracks for the player.
//!
//! ## Overview
//!
//! - [`discovery`]: the resolution contract (search, alternative query,
//!   filename analysis) and the degrading call-site helpers
//! - [`providers`]: Gemini-backed implementation (feature `gemini`)
//! - [`extractor`]: real duration of imported files via `lofty`
//! - [`import`]: local import, metadata edit, delete and purge with library
//!   events

pub mod discovery;
pub mod error;
pub mod extractor;
pub mod import;
pub mod providers;

pub use discovery::{
    alternative_or_none, analyze_or_fallback, first_resolvable, search_or_empty,
    DiscoveryService, FileAnalysis, OfflineDiscovery, TrackCandidate,
};
pub use error::{MetadataError, Result};
pub use extractor::{DurationProbe, LoftyDurationProbe, ProbedAudio};
pub use import::ImportService;
