//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by every core crate:
//! - Logging and tracing initialisation
//! - Configuration management with fail-fast capability checks
//! - Typed event bus for playback and library notifications

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
