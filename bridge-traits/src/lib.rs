//! # Host Bridge Traits
//!
//! Platform abstraction traits implemented by each host (browser shell,
//! desktop shell, tests).
//!
//! ## Overview
//!
//! This crate defines the contract between the player core and the host. Each
//! trait is a capability the core needs but cannot provide portably.
//!
//! ## Traits
//!
//! ### Media
//! - [`AudioElement`](media::AudioElement) / [`ObjectUrlFactory`](media::ObjectUrlFactory) - local blob playback
//! - [`StreamWidgetHost`](media::StreamWidgetHost) / [`StreamWidget`](media::StreamWidget) - embedded remote player
//! - [`MediaListener`](media::MediaListener) - push channel for ready/playing/paused/ended/error
//!
//! ### Networking & Storage
//! - [`HttpClient`](http::HttpClient) - Async HTTP for remote collaborators
//! - [`SettingsStore`](storage::SettingsStore) - Durable key-value settings
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Hosts should
//! convert their native failures into it with an actionable message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind `Arc`.

pub mod error;
pub mod http;
pub mod media;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use media::{
    AudioElement, MediaListener, MediaSignal, ObjectUrlFactory, StreamWidget, StreamWidgetHost,
};
pub use storage::SettingsStore;
pub use time::{Clock, ConsoleLogger, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
