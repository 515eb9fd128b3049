//! # Player State
//!
//! The engine's single observable snapshot. Only the engine writes it; hosts
//! read clones through [`PlaybackEngine::snapshot`](crate::PlaybackEngine::snapshot).

use core_library::models::Track;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Repeat behaviour at end of track. Only `One` changes playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    One,
    All,
}

impl RepeatMode {
    /// Off → One → All → Off
    pub fn next(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::One,
            RepeatMode::One => RepeatMode::All,
            RepeatMode::All => RepeatMode::Off,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::One => "one",
            RepeatMode::All => "all",
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport lifecycle.
///
/// ```text
/// Idle ──play──> Loading ──ready──> Playing <──> Paused
///                   │                  │
///                   └──> Resolving <───┘ (blocked remote asset)
///                            │
///                            └──> Stalled (nothing to substitute)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    /// No current track
    #[default]
    Idle,
    /// A play request is in flight
    Loading,
    /// Looking for a playable substitute
    Resolving,
    Playing,
    Paused,
    /// Current track cannot play; user action needed
    Stalled,
}

/// Engine status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub current_track: Option<Track>,
    /// Last known transport flag, mirrored from backend signals and
    /// optimistic toggles.
    pub is_playing: bool,
    /// Seconds
    pub current_time: f64,
    /// Seconds, `0.0` while unknown
    pub duration: f64,
    /// `0..=100`
    pub volume: u8,
    pub repeat_mode: RepeatMode,
    /// Stored only.
    pub shuffle: bool,
    pub transport: TransportState,
}

impl PlayerState {
    pub fn with_volume(volume: u8) -> Self {
        Self {
            volume: volume.min(100),
            ..Default::default()
        }
    }

    pub fn current_track_id(&self) -> Option<&str> {
        self.current_track.as_ref().map(|t| t.id.as_str())
    }

    /// Position as a fraction of the duration, `0.0` while unknown.
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            current_track: None,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: 80,
            repeat_mode: RepeatMode::Off,
            shuffle: false,
            transport: TransportState::Idle,
        }
    }
}

/// Clamps any numeric volume input into `0..=100`. NaN becomes 0.
pub fn clamp_volume(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

/// Clamps a seek fraction into `0.0..=1.0`. NaN becomes 0.
pub fn clamp_fraction(fraction: f64) -> f64 {
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}

/// `m:ss` display form of a position in seconds.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
