//! Settings Storage Abstraction
//!
//! Provides a platform-agnostic trait for small, durable key-value settings
//! (the browser's `localStorage`, desktop config databases, mobile
//! preference stores).

use async_trait::async_trait;

use crate::error::Result;

/// Key-value settings storage trait
///
/// Abstracts platform-specific preferences storage:
/// - Web: `localStorage`
/// - Desktop: SQLite-backed key-value table
/// - Mobile: UserDefaults / SharedPreferences
///
/// Values are process-wide and survive restarts. The player uses this for
/// scalars such as the persisted volume.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn remember_volume(store: &dyn SettingsStore, volume: u8) -> Result<()> {
///     store.set_i64("vs_volume", volume as i64).await
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store an integer value
    async fn set_i64(&self, key: &str, value: i64) -> Result<()>;

    /// Retrieve an integer value
    ///
    /// Returns `Ok(None)` when the key has never been written.
    async fn get_i64(&self, key: &str) -> Result<Option<i64>>;

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }
}
