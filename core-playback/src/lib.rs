//! # Playback Module
//!
//! One transport surface over two media backends.
//!
//! ## Overview
//!
//! - [`traits`]: the [`SourceBackend`] capability interface and signal
//!   plumbing
//! - [`backends`]: local blob playback and the embedded streaming widget
//! - [`engine`]: the [`PlaybackEngine`] state machine
//! - [`recovery`]: bounded healing of blocked remote tracks
//! - [`poller`]: 500 ms position sync
//! - [`state`]: [`PlayerState`] and display helpers
//!
//! ## Example
//!
//! ```rust,ignore
//! use core_playback::{EngineConfig, EngineDeps, PlaybackEngine};
//!
//! let engine = PlaybackEngine::new(deps, EngineConfig::default())?;
//! engine.start().await?;
//! engine.play(track).await?;
//! engine.seek(0.5).await;
//! engine.shutdown().await;
//! ```

pub mod backends;
pub mod config;
pub mod engine;
pub mod error;
pub mod poller;
pub mod recovery;
pub mod state;
pub mod traits;

pub use config::EngineConfig;
pub use engine::{EngineDeps, HealOutcome, PlayOutcome, PlaybackEngine};
pub use error::{PlaybackError, Result};
pub use recovery::{RecoveryCoordinator, Substitution};
pub use state::{format_time, PlayerState, RepeatMode, TransportState};
pub use traits::{BackendEvent, ErrorDisposition, MediaLocator, Ready, SourceBackend};
