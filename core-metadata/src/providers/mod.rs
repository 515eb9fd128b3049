//! Remote Discovery Providers
//!
//! Implementations of [`DiscoveryService`](crate::discovery::DiscoveryService)
//! backed by hosted models. Providers are feature-gated so hosts without a
//! key can build with [`OfflineDiscovery`](crate::discovery::OfflineDiscovery)
//! only.

#[cfg(feature = "gemini")]
pub mod gemini;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiConfig, GeminiDiscovery};
