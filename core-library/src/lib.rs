//! # Library Management Module
//!
//! Owns the persisted track store.
//!
//! ## Overview
//!
//! - [`Track`](models::Track) model shared by discovery, import and playback
//! - SQLite schema and connection pooling ([`db`])
//! - [`TrackRepository`](repositories::TrackRepository): records and audio
//!   blobs keyed by track id, transactional delete, storage estimate

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{AudioBlob, StorageEstimate, StorageStatus, Track, TrackSource};
pub use repositories::{SqliteTrackRepository, TrackRepository};
