//! # Repository Pattern Implementation
//!
//! Repository traits and their SQLite implementations. Only tracks (with
//! their audio blobs) are persisted; playback state never is.

pub mod track;

pub use track::{SqliteTrackRepository, TrackRepository};
