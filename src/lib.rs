//! Workspace placeholder crate.
//!
//! This crate exposes feature flags that map onto the individual workspace
//! crates (`core-service`, `core-metadata`, `core-playback`). Host
//! applications can depend on `vibestream-workspace` and pick a feature set
//! instead of wiring each crate by hand.

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(feature = "gemini")]
pub use core_metadata as metadata;

#[cfg(feature = "playback-only")]
pub use core_playback as playback;
