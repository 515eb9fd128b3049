//! # Core Configuration Module
//!
//! Builder-based configuration holding every host capability the player core
//! needs.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - persisted volume and preferences
//! - `AudioElement` + `ObjectUrlFactory` - local blob playback
//! - `StreamWidgetHost` - embedded remote player
//!
//! ## Optional Dependencies
//!
//! - `HttpClient` - discovery requests (desktop default: reqwest)
//! - `Clock` - timestamps for imported tracks (default: system clock)
//! - `LoggerSink` via [`LoggingConfig`]
//!
//! With the `desktop-shims` feature, a missing `SettingsStore` or
//! `HttpClient` is replaced by the `bridge-desktop` implementation.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/data/vibestream.db")
//!     .audio_element(Arc::new(HostAudio::new()))
//!     .object_url_factory(Arc::new(HostUrls))
//!     .stream_widget_host(Arc::new(HostWidgets::new()))
//!     .settings_store(Arc::new(LocalStorageSettings))
//!     .discovery_api_key(std::env::var("GEMINI_API_KEY").ok())
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use bridge_traits::{
    AudioElement, Clock, HttpClient, ObjectUrlFactory, SettingsStore, StreamWidgetHost,
    SystemClock,
};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default storage quota reported by the library estimate (2 GiB).
pub const DEFAULT_STORAGE_QUOTA_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Core configuration. Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// SQLite database for tracks and blobs; `None` keeps everything in memory
    pub database_path: Option<PathBuf>,

    /// Quota reported alongside library usage
    pub storage_quota_bytes: u64,

    /// API key for the discovery service, if any
    pub discovery_api_key: Option<String>,

    pub http_client: Option<Arc<dyn HttpClient>>,

    pub settings_store: Arc<dyn SettingsStore>,

    pub audio_element: Arc<dyn AudioElement>,

    pub object_url_factory: Arc<dyn ObjectUrlFactory>,

    pub stream_widget_host: Arc<dyn StreamWidgetHost>,

    pub clock: Arc<dyn Clock>,

    /// Installed by the session when present
    pub logging: Option<LoggingConfig>,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("storage_quota_bytes", &self.storage_quota_bytes)
            .field(
                "discovery_api_key",
                &self.discovery_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field("settings_store", &"SettingsStore { ... }")
            .field("audio_element", &"AudioElement { ... }")
            .field("object_url_factory", &"ObjectUrlFactory { ... }")
            .field("stream_widget_host", &"StreamWidgetHost { ... }")
            .field("logging", &self.logging)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates values that cannot be checked while building.
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        if self.storage_quota_bytes == 0 {
            return Err(Error::Config(
                "Storage quota must be greater than 0 bytes".to_string(),
            ));
        }

        if let Some(key) = &self.discovery_api_key {
            if key.trim().is_empty() {
                return Err(Error::Config(
                    "Discovery API key cannot be blank; omit it instead".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn shim_unavailable(capability: &str, cause: impl std::fmt::Display) -> Error {
    Error::ShimUnavailable {
        capability: capability.to_string(),
        message: cause.to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(
    database_path: Option<&PathBuf>,
) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let candidate = database_path
        .and_then(|p| p.parent())
        .map(|parent| parent.join("settings.db"));

    let init_store = move || -> Result<SqliteSettingsStore> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| shim_unavailable("SettingsStore", e))?;

        runtime
            .block_on(async {
                match candidate {
                    Some(path) => SqliteSettingsStore::open(path).await,
                    None => SqliteSettingsStore::in_memory().await,
                }
            })
            .map_err(|e| shim_unavailable("SettingsStore", e))
    };

    // block_on panics inside a runtime, so build on a plain thread there.
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(init_store).join().map_err(|_| {
            shim_unavailable("SettingsStore", "initialization thread panicked")
        })??,
        Err(_) => init_store()?,
    };

    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(
    _database_path: Option<&PathBuf>,
) -> Result<Arc<dyn SettingsStore>> {
    Err(missing(
        "SettingsStore",
        "SettingsStore implementation is required to persist the volume. \
         Desktop: enable the 'desktop-shims' feature for the SQLite store. \
         Web: inject a localStorage-backed store.",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Option<Arc<dyn HttpClient>> {
    Some(Arc::new(bridge_desktop::ReqwestHttpClient::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Option<Arc<dyn HttpClient>> {
    None
}

/// Builder for [`CoreConfig`].
///
/// [`build()`](CoreConfigBuilder::build) fails fast with
/// [`Error::CapabilityMissing`] naming the first absent capability.
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    storage_quota_bytes: u64,
    discovery_api_key: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    audio_element: Option<Arc<dyn AudioElement>>,
    object_url_factory: Option<Arc<dyn ObjectUrlFactory>>,
    stream_widget_host: Option<Arc<dyn StreamWidgetHost>>,
    clock: Option<Arc<dyn Clock>>,
    logging: Option<LoggingConfig>,
}

impl Default for CoreConfigBuilder {
    fn default() -> Self {
        Self {
            database_path: None,
            storage_quota_bytes: DEFAULT_STORAGE_QUOTA_BYTES,
            discovery_api_key: None,
            http_client: None,
            settings_store: None,
            audio_element: None,
            object_url_factory: None,
            stream_widget_host: None,
            clock: None,
            logging: None,
        }
    }
}

impl CoreConfigBuilder {
    /// Sets the SQLite database path for tracks and blobs.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn storage_quota_bytes(mut self, quota: u64) -> Self {
        self.storage_quota_bytes = quota;
        self
    }

    /// Sets the discovery API key. `None` leaves discovery unconfigured.
    pub fn discovery_api_key(mut self, key: Option<String>) -> Self {
        self.discovery_api_key = key;
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the settings store (required without `desktop-shims`).
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the host audio element (required).
    pub fn audio_element(mut self, element: Arc<dyn AudioElement>) -> Self {
        self.audio_element = Some(element);
        self
    }

    /// Sets the object URL factory (required).
    pub fn object_url_factory(mut self, factory: Arc<dyn ObjectUrlFactory>) -> Self {
        self.object_url_factory = Some(factory);
        self
    }

    /// Sets the streaming widget host (required).
    pub fn stream_widget_host(mut self, host: Arc<dyn StreamWidgetHost>) -> Self {
        self.stream_widget_host = Some(host);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required capability is absent
    /// - [`Error::Config`] when a value fails validation
    pub fn build(self) -> Result<CoreConfig> {
        let audio_element = self.audio_element.ok_or_else(|| {
            missing(
                "AudioElement",
                "An AudioElement is required for local playback. \
                 Web: wrap an HTMLAudioElement.",
            )
        })?;

        let object_url_factory = self.object_url_factory.ok_or_else(|| {
            missing(
                "ObjectUrlFactory",
                "An ObjectUrlFactory is required to address stored blobs. \
                 Web: wrap URL.createObjectURL / URL.revokeObjectURL.",
            )
        })?;

        let stream_widget_host = self.stream_widget_host.ok_or_else(|| {
            missing(
                "StreamWidgetHost",
                "A StreamWidgetHost is required for remote playback. \
                 Web: wrap the embedded player SDK.",
            )
        })?;

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(self.database_path.as_ref())?,
        };

        let http_client = self.http_client.or_else(provide_default_http_client);

        let config = CoreConfig {
            database_path: self.database_path,
            storage_quota_bytes: self.storage_quota_bytes,
            discovery_api_key: self.discovery_api_key,
            http_client,
            settings_store,
            audio_element,
            object_url_factory,
            stream_widget_host,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            logging: self.logging,
        };

        config.validate()?;
        Ok(config)
    }
}
